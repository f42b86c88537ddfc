use serde::Deserialize;
use serde::Serialize;

/// The newsletter categories a visitor can subscribe to. These double as
/// search terms for the news aggregator and as column names in the
/// spreadsheet store, so the set is fixed.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
pub enum Topic {
    Technology,
    Sports,
    Politics,
    Finance,
}

impl Topic {
    pub const ALL: [Topic; 4] = [
        Topic::Technology,
        Topic::Sports,
        Topic::Politics,
        Topic::Finance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Technology => "Technology",
            Topic::Sports => "Sports",
            Topic::Politics => "Politics",
            Topic::Finance => "Finance",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "Technology" => Ok(Topic::Technology),
            "Sports" => Ok(Topic::Sports),
            "Politics" => Ok(Topic::Politics),
            "Finance" => Ok(Topic::Finance),
            other => Err(format!("Unknown topic: {other:?}")),
        }
    }
}

impl std::fmt::Display for Topic {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
