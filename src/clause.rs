//! Locates the recognised clause keywords inside a query string.
//!
//! This is a textual micro-grammar, not a parser: every keyword is searched
//! for independently (leftmost occurrence), and its argument ends at the first
//! `)` after the opening parenthesis. A keyword inside a string literal is
//! therefore found like any other, and literals containing `)` are outside
//! the grammar.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Find,
    Limit,
    Sort,
    Count,
    Distinct,
}

impl Keyword {
    pub const ALL: [Keyword; 5] = [
        Keyword::Find,
        Keyword::Limit,
        Keyword::Sort,
        Keyword::Count,
        Keyword::Distinct,
    ];

    /// The literal text searched for, opening parenthesis included.
    pub fn text(self) -> &'static str {
        match self {
            Keyword::Find => "find(",
            Keyword::Limit => ".limit(",
            Keyword::Sort => ".sort(",
            Keyword::Count => ".count(",
            Keyword::Distinct => ".distinct(",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// The byte span of one located keyword's argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clause {
    pub argument_start: usize,
    pub argument_end: usize,
}

impl Clause {
    fn locate(query: &str, keyword: Keyword) -> Option<Self> {
        let start = query.find(keyword.text())?;
        let argument_start = start + keyword.text().len();
        // an unterminated argument runs to the end of the input
        let argument_end = query[argument_start..]
            .find(')')
            .map_or(query.len(), |offset| argument_start + offset);
        Some(Self {
            argument_start,
            argument_end,
        })
    }
}

/// The clauses found in one query, borrowed from it for the length of a request.
#[derive(Debug, Clone)]
pub struct Clauses<'q> {
    query: &'q str,
    found: [Option<Clause>; 5],
}

impl<'q> Clauses<'q> {
    pub fn locate(query: &'q str) -> Self {
        let found = Keyword::ALL.map(|keyword| Clause::locate(query, keyword));
        Self { query, found }
    }

    pub fn get(&self, keyword: Keyword) -> Option<&Clause> {
        self.found[keyword.index()].as_ref()
    }

    pub fn has(&self, keyword: Keyword) -> bool {
        self.get(keyword).is_some()
    }

    /// The raw, untrimmed argument text of a present clause.
    pub fn argument(&self, keyword: Keyword) -> Option<&'q str> {
        self.get(keyword)
            .map(|clause| &self.query[clause.argument_start..clause.argument_end])
    }
}
