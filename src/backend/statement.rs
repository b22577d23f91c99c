use std::fmt;

/// Replica acknowledgement requirement of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Consistency {
    One,
    LocalOne,
    Quorum,
    LocalQuorum,
    All,
}

impl fmt::Display for Consistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::One => "ONE",
            Self::LocalOne => "LOCAL_ONE",
            Self::Quorum => "QUORUM",
            Self::LocalQuorum => "LOCAL_QUORUM",
            Self::All => "ALL",
        };
        f.write_str(name)
    }
}

/// A fully shaped request: CQL text plus the per-request options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub cql: String,
    pub consistency: Consistency,
    pub page_size: u32,
    pub tracing: bool,
}

impl Statement {
    /// `SELECT key, blob` over the whole table.
    pub fn full_scan(qualified_table: &str, page_size: u32) -> Self {
        Self {
            cql: format!("SELECT key, blob FROM {qualified_table};"),
            consistency: Consistency::LocalQuorum,
            page_size,
            tracing: false,
        }
    }

    /// Traced `count(*)` over the whole table.
    pub fn traced_count(qualified_table: &str, page_size: u32) -> Self {
        Self {
            cql: format!("SELECT count(*) AS count FROM {qualified_table};"),
            consistency: Consistency::LocalQuorum,
            page_size,
            tracing: true,
        }
    }

    pub fn insert_blob(qualified_table: &str) -> Self {
        Self {
            cql: format!("INSERT INTO {qualified_table} (key, blob) VALUES (?, ?);"),
            consistency: Consistency::LocalQuorum,
            page_size: 0,
            tracing: false,
        }
    }
}
