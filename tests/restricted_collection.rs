use gumshoe::command::Command;
use gumshoe::engine::{interpret, Engine, Outcome};
use gumshoe::persist::{PersistenceMode, Persistor};
use gumshoe::policy::{solution_suspect, visible_collections, Verdict};
use gumshoe::settings::{Limits, Settings};
use gumshoe::GumshoeError;

fn settings() -> Settings {
    Settings {
        salt: "-s3cret".into(),
        ..Settings::default()
    }
}

fn store() -> Persistor {
    let store = Persistor::new(PersistenceMode::InMemory).unwrap();
    store
        .seed_from_str(
            r#"{
                "person": [{"_id": "p1", "name": "Jeremy Bowers"}],
                "solution": [{"_id": "Jeremy Bowers-s3cret", "count": 0}]
            }"#,
        )
        .unwrap();
    store
}

#[test]
fn solution_check_is_recognized() {
    let built = interpret(Some("db.solution.find({ \"name\": \"suspectId\" })"), &Limits::default()).unwrap();
    assert_eq!(
        built,
        Command::SolutionCheck {
            suspect_name: "suspectId".into()
        }
    );
    assert_eq!(built.to_string(), "db.solution.find({\"name\":\"suspectId\"})");
}

#[test]
fn solution_check_accepts_bare_name_key() {
    let built = interpret(Some("db.solution.find({name: \"Jeremy Bowers\"})"), &Limits::default()).unwrap();
    assert_eq!(
        built,
        Command::SolutionCheck {
            suspect_name: "Jeremy Bowers".into()
        }
    );
}

#[test]
fn other_access_to_solution_is_refused() {
    let limits = Limits::default();
    for query in [
        "db.solution.find()",
        "db.solution.update({})",
        "db.solution.count()",
        "db.solution.distinct('name')",
        "db.solution.find({\"name\": 123})",
        "db.solution.find({\"id\": \"x\"})",
        "db.solution.find({\"name\": \"a\", \"count\": 1})",
    ] {
        assert_eq!(
            interpret(Some(query), &limits),
            Err(GumshoeError::RestrictedCollection),
            "{query} should be refused"
        );
    }
    assert_eq!(
        GumshoeError::RestrictedCollection.to_string(),
        "Not allowed. This is a restricted collection."
    );
}

#[test]
fn empty_suspect_name_is_missing() {
    assert_eq!(
        interpret(Some("db.solution.find({ \"name\": \"\" })"), &Limits::default()),
        Err(GumshoeError::MissingSuspectName)
    );
}

#[test]
fn suspect_parsing() {
    assert_eq!(solution_suspect("{\"name\": \"solution1\"}"), Ok("solution1".into()));
    assert_eq!(solution_suspect("{name: \"solution1\"}"), Ok("solution1".into()));
    assert!(solution_suspect("solution1").is_err());
    assert!(solution_suspect("").is_err());
}

#[test]
fn correct_guess_is_solved_and_counted() {
    let store = store();
    let settings = settings();
    let engine = Engine::new(&store, &settings);
    let outcome = engine
        .evaluate(Some("db.solution.find({\"name\": \"Jeremy Bowers\"})"))
        .unwrap();
    assert_eq!(outcome, Outcome::Verdict(Verdict::Solved));
    assert_eq!(
        serde_json::to_value(&outcome).unwrap(),
        serde_json::json!({"verdict": "YOU DID IT! YOU SOLVED THE MONGODB MURDER MYSTERY!!!"})
    );
}

#[test]
fn wrong_guess_is_wrong() {
    let store = store();
    let settings = settings();
    let engine = Engine::new(&store, &settings);
    let outcome = engine
        .evaluate(Some("db.solution.find({\"name\": \"Annabel Miller\"})"))
        .unwrap();
    assert_eq!(outcome, Outcome::Verdict(Verdict::Wrong));
    assert_eq!(
        Verdict::Wrong.message(),
        "OH NO YOU HAVE ACCUSED THE WRONG PERSON. YIKES."
    );
}

#[test]
fn salt_is_part_of_the_key() {
    let store = store();
    let unsalted = Settings::default();
    let engine = Engine::new(&store, &unsalted);
    let outcome = engine
        .evaluate(Some("db.solution.find({\"name\": \"Jeremy Bowers\"})"))
        .unwrap();
    assert_eq!(outcome, Outcome::Verdict(Verdict::Wrong), "unsalted key must not match");
}

#[test]
fn listing_hides_the_solution_collection() {
    let store = store();
    let settings = settings();
    let engine = Engine::new(&store, &settings);
    assert_eq!(
        engine.evaluate(Some("db.getCollectionNames()")).unwrap(),
        Outcome::Names(vec!["person".into()])
    );
    assert_eq!(
        visible_collections(vec!["solution".into(), "crime".into()]),
        vec!["crime".to_string()]
    );
}
