use logsift_types::FilterSpec;
#[cfg(test)]
use logsift_types::LogRecord;

/// A single constraint on the record table
#[derive(Clone, Debug, PartialEq, Eq)]
enum Clause {
    IpEquals(String),
    UrlContains(String),
    DateFrom(String),
    DateTo(String),
}

impl Clause {
    /// SQL fragment with one positional placeholder
    fn sql(&self) -> &'static str {
        match self {
            Self::IpEquals(_) => "ip = ?",
            Self::UrlContains(_) => "url LIKE ? ESCAPE '\\'",
            Self::DateFrom(_) => "date >= ?",
            Self::DateTo(_) => "date <= ?",
        }
    }

    /// Value bound to the placeholder
    fn param(&self) -> String {
        match self {
            Self::IpEquals(v) | Self::DateFrom(v) | Self::DateTo(v) => v.clone(),
            Self::UrlContains(v) => format!("%{}%", escape_like(v)),
        }
    }

    #[cfg(test)]
    fn matches(&self, record: &LogRecord) -> bool {
        match self {
            Self::IpEquals(v) => record.ip == *v,
            // LIKE folds ASCII case only
            Self::UrlContains(v) => record
                .url
                .to_ascii_lowercase()
                .contains(&v.to_ascii_lowercase()),
            Self::DateFrom(v) => record.timestamp.as_str() >= v.as_str(),
            Self::DateTo(v) => record.timestamp.as_str() <= v.as_str(),
        }
    }
}

/// Compiled predicate for [`RecordStore::query`](crate::RecordStore::query)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Query {
    clauses: Vec<Clause>,
    limit: usize,
}

impl Query {
    /// `WHERE ...` fragment, or an empty string when nothing is constrained
    pub fn where_clause(&self) -> String {
        if self.clauses.is_empty() {
            return String::new();
        }
        let parts: Vec<&str> = self.clauses.iter().map(Clause::sql).collect();
        format!("WHERE {}", parts.join(" AND "))
    }

    /// Parameters in placeholder order
    pub fn params(&self) -> Vec<String> {
        self.clauses.iter().map(Clause::param).collect()
    }

    /// Maximum number of rows to return
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Check if the query has no constraints
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Evaluate the predicate against a record in memory
    #[cfg(test)]
    pub fn matches(&self, record: &LogRecord) -> bool {
        self.clauses.iter().all(|c| c.matches(record))
    }
}

/// Builds a [`Query`] from a [`FilterSpec`]
pub struct QueryBuilder;

impl QueryBuilder {
    pub fn build(spec: &FilterSpec) -> Query {
        let spec = spec.clone().normalized();
        let limit = spec.effective_limit();
        let mut clauses = Vec::new();

        if let Some(ip) = spec.ip {
            clauses.push(Clause::IpEquals(ip));
        }
        if let Some(keyword) = spec.keyword {
            clauses.push(Clause::UrlContains(keyword));
        }
        if let Some(from) = spec.date_from {
            clauses.push(Clause::DateFrom(from));
        }
        if let Some(to) = spec.date_to {
            clauses.push(Clause::DateTo(to));
        }

        Query { clauses, limit }
    }
}

/// Escape LIKE wildcards so the keyword matches literally
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
