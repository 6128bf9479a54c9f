use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use logtree_types::{LEVEL_NONE, Rank};

use crate::error::{LogError, Result};

/// Name of the synthetic terminal level that disables emission
pub const OFF: &str = "OFF";

/// Marker prefix designating the default root level in a registration list
pub const DEFAULT_MARKER: char = '*';

/// Out-of-the-box levels, in ascending severity
pub const DEFAULT_LEVELS: [&str; 6] = ["TRACE", "DEBUG", "*INFO", "WARN", "ERROR", "FATAL"];

/// Every schema gets a distinct generation so stale levels can be detected
static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// A level minted from a specific schema
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Level {
    name: Arc<str>,
    rank: Rank,
    generation: u64,
}

impl Level {
    /// Level name (e.g. `DEBUG`)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Numeric rank within the schema that minted this level
    pub fn rank(&self) -> Rank {
        self.rank
    }

    /// Generation of the schema that minted this level
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.rank)
    }
}

/// The ordered set of severity levels
#[derive(Clone, Debug)]
pub struct LevelSchema {
    /// Registered names in ascending severity, `OFF` excluded
    names: Vec<Arc<str>>,

    /// Index of the default root level within `names`
    default: usize,

    /// Longest registered name, used to pad level labels
    label_width: usize,

    generation: u64,
}

impl LevelSchema {
    /// Build a schema from plain names, marking the default by index
    pub fn new<S: AsRef<str>>(names: &[S], default_index: usize) -> Result<Self> {
        if names.is_empty() {
            return Err(LogError::config("at least one log level must be registered"));
        }
        if default_index >= names.len() {
            return Err(LogError::config(format!(
                "default level index {} is out of range for {} levels",
                default_index,
                names.len()
            )));
        }

        let mut validated: Vec<Arc<str>> = Vec::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            let name = name.as_ref();
            validate_level_name(name, i)?;
            if validated.iter().any(|existing| &**existing == name) {
                return Err(LogError::config(format!(
                    "level '{}' is registered more than once",
                    name
                )));
            }
            validated.push(Arc::from(name));
        }

        Ok(Self::from_validated(validated, default_index))
    }

    /// Build a schema from names where exactly one carries the `*` default marker
    pub fn parse<S: AsRef<str>>(marked: &[S]) -> Result<Self> {
        let mut names = Vec::with_capacity(marked.len());
        let mut default_index = None;

        for (i, entry) in marked.iter().enumerate() {
            let entry = entry.as_ref();
            match entry.strip_prefix(DEFAULT_MARKER) {
                Some(name) => {
                    if default_index.is_some() {
                        return Err(LogError::config(format!(
                            "only one level may carry the '{}' default marker (second one on '{}')",
                            DEFAULT_MARKER, name
                        )));
                    }
                    default_index = Some(i);
                    names.push(name);
                }
                None => names.push(entry),
            }
        }

        if names.is_empty() {
            return Err(LogError::config("at least one log level must be registered"));
        }

        let default_index = default_index.ok_or_else(|| {
            LogError::config(format!(
                "one level must carry the '{}' default marker to set the root level",
                DEFAULT_MARKER
            ))
        })?;

        Self::new(&names, default_index)
    }

    fn from_validated(names: Vec<Arc<str>>, default: usize) -> Self {
        let label_width = names.iter().map(|n| n.len()).max().unwrap_or(0);
        Self {
            names,
            default,
            label_width,
            generation: NEXT_GENERATION.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Number of registered levels (`OFF` excluded)
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// A schema always holds at least one level
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Registered names in ascending severity (`OFF` excluded)
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|n| &**n)
    }

    /// Registered names with the default marked, as accepted by [`LevelSchema::parse`]
    pub fn marked_names(&self) -> Vec<String> {
        self.names
            .iter()
            .enumerate()
            .map(|(i, n)| {
                if i == self.default {
                    format!("{}{}", DEFAULT_MARKER, n)
                } else {
                    n.to_string()
                }
            })
            .collect()
    }

    /// All registered levels (`OFF` excluded)
    pub fn levels(&self) -> Vec<Level> {
        self.names
            .iter()
            .enumerate()
            .map(|(i, n)| self.mint(n.clone(), Rank::for_position(i)))
            .collect()
    }

    /// The default root level
    pub fn default_level(&self) -> Level {
        self.mint(self.names[self.default].clone(), self.default_rank())
    }

    /// Rank of the default root level
    pub fn default_rank(&self) -> Rank {
        Rank::for_position(self.default)
    }

    /// Rank of the synthetic `OFF` level, above every registered level
    pub fn off_rank(&self) -> Rank {
        Rank::for_position(self.names.len())
    }

    /// Width used to pad level labels
    pub fn label_width(&self) -> usize {
        self.label_width
    }

    /// Generation of this schema
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Resolve a level name to a rank; `none` means no explicit level
    pub fn rank_of(&self, name: &str) -> Result<Option<Rank>> {
        if name == LEVEL_NONE {
            return Ok(None);
        }
        if name == OFF {
            return Ok(Some(self.off_rank()));
        }
        self.names
            .iter()
            .position(|n| &**n == name)
            .map(|i| Some(Rank::for_position(i)))
            .ok_or_else(|| LogError::unknown_level(name))
    }

    /// Resolve a rank to its level name
    pub fn name_of(&self, rank: Rank) -> Result<&str> {
        if rank == self.off_rank() {
            return Ok(OFF);
        }
        let raw = rank.get();
        if raw % Rank::STEP != 0 {
            return Err(LogError::unknown_level(rank));
        }
        let index = (raw / Rank::STEP) as usize - 1;
        self.names
            .get(index)
            .map(|n| &**n)
            .ok_or_else(|| LogError::unknown_level(rank))
    }

    /// Name for an optional rank, `none` when unset
    pub fn setting_name(&self, rank: Option<Rank>) -> Result<&str> {
        match rank {
            Some(rank) => self.name_of(rank),
            None => Ok(LEVEL_NONE),
        }
    }

    /// Look up a level by name (`OFF` included)
    pub fn level(&self, name: &str) -> Result<Level> {
        if name == OFF {
            return Ok(self.mint(Arc::from(OFF), self.off_rank()));
        }
        let index = self
            .names
            .iter()
            .position(|n| &**n == name)
            .ok_or_else(|| LogError::unknown_level(name))?;
        Ok(self.mint(self.names[index].clone(), Rank::for_position(index)))
    }

    /// Re-resolve a level minted by another schema, by name
    pub fn refresh(&self, level: &Level) -> Result<Level> {
        if level.generation == self.generation {
            return Ok(level.clone());
        }
        self.level(level.name())
    }

    fn mint(&self, name: Arc<str>, rank: Rank) -> Level {
        Level {
            name,
            rank,
            generation: self.generation,
        }
    }
}

impl Default for LevelSchema {
    fn default() -> Self {
        let names = DEFAULT_LEVELS
            .iter()
            .map(|n| Arc::from(n.trim_start_matches(DEFAULT_MARKER)))
            .collect();
        let default = DEFAULT_LEVELS
            .iter()
            .position(|n| n.starts_with(DEFAULT_MARKER))
            .unwrap_or(0);
        Self::from_validated(names, default)
    }
}

fn validate_level_name(name: &str, position: usize) -> Result<()> {
    if name.trim().is_empty() {
        return Err(LogError::config(format!(
            "level entry number {} is blank",
            position + 1
        )));
    }
    if name.chars().any(|c| c.is_whitespace() || c == DEFAULT_MARKER) {
        return Err(LogError::config(format!(
            "level '{}' may not contain whitespace or '{}'",
            name, DEFAULT_MARKER
        )));
    }
    if name == OFF {
        return Err(LogError::config(
            "the 'OFF' level is generated automatically and must not be supplied",
        ));
    }
    if name == LEVEL_NONE {
        return Err(LogError::config(
            "'none' is reserved for unsetting filters and cannot name a level",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranks_follow_list_order() {
        let schema = LevelSchema::parse(&["TRACE", "DEBUG", "*INFO", "WARN", "ERROR"]).unwrap();
        let ranks: Vec<u32> = schema.levels().iter().map(|l| l.rank().get()).collect();
        assert_eq!(ranks, vec![100, 200, 300, 400, 500]);
        assert_eq!(schema.off_rank().get(), 600);
        assert_eq!(schema.default_level().name(), "INFO");
        assert_eq!(schema.default_rank().get(), 300);
    }

    #[test]
    fn test_name_rank_lookups() {
        let schema = LevelSchema::default();
        let debug = schema.rank_of("DEBUG").unwrap().unwrap();
        assert_eq!(schema.name_of(debug).unwrap(), "DEBUG");
        assert_eq!(schema.rank_of("none").unwrap(), None);
        assert_eq!(schema.rank_of("OFF").unwrap(), Some(schema.off_rank()));
        assert_eq!(schema.name_of(schema.off_rank()).unwrap(), "OFF");
        assert_eq!(schema.setting_name(None).unwrap(), "none");
    }

    #[test]
    fn test_unknown_lookups_fail() {
        let schema = LevelSchema::default();
        assert!(matches!(
            schema.rank_of("VERBOSE"),
            Err(LogError::UnknownLevel { .. })
        ));
        assert!(matches!(
            schema.name_of(Rank::new(250).unwrap()),
            Err(LogError::UnknownLevel { .. })
        ));
        assert!(matches!(
            schema.name_of(Rank::new(5000).unwrap()),
            Err(LogError::UnknownLevel { .. })
        ));
        assert!(matches!(schema.level("debug"), Err(LogError::UnknownLevel { .. })));
    }

    #[test]
    fn test_invalid_schemas_rejected() {
        let empty: [&str; 0] = [];
        assert!(matches!(LevelSchema::parse(&empty), Err(LogError::Configuration { .. })));
        assert!(LevelSchema::parse(&["DEBUG", "INFO"]).is_err());
        assert!(LevelSchema::parse(&["*DEBUG", "*INFO"]).is_err());
        assert!(LevelSchema::parse(&["*DEBUG", "DEBUG"]).is_err());
        assert!(LevelSchema::parse(&["*DEBUG", " "]).is_err());
        assert!(LevelSchema::parse(&["*DEBUG", "OFF"]).is_err());
        assert!(LevelSchema::parse(&["*DEBUG", "none"]).is_err());
        assert!(LevelSchema::parse(&["*DEBUG", "NOT OK"]).is_err());
        assert!(LevelSchema::new(&["DEBUG"], 3).is_err());
    }

    #[test]
    fn test_marked_names_round_trip() {
        let schema = LevelSchema::parse(&["DEBUG", "FLOW", "*INFO", "WARN", "ERROR"]).unwrap();
        let marked = schema.marked_names();
        assert_eq!(marked[2], "*INFO");
        let again = LevelSchema::parse(&marked).unwrap();
        assert_eq!(again.names().collect::<Vec<_>>(), schema.names().collect::<Vec<_>>());
        assert_ne!(again.generation(), schema.generation());
    }

    #[test]
    fn test_refresh_by_name() {
        let old = LevelSchema::parse(&["TRACE", "DEBUG", "*INFO"]).unwrap();
        let new = LevelSchema::parse(&["DEBUG", "*INFO", "WARN"]).unwrap();
        let debug = old.level("DEBUG").unwrap();
        assert_eq!(debug.rank().get(), 200);

        let refreshed = new.refresh(&debug).unwrap();
        assert_eq!(refreshed.rank().get(), 100);
        assert_eq!(refreshed.generation(), new.generation());

        let trace = old.level("TRACE").unwrap();
        assert!(new.refresh(&trace).is_err());
    }

    #[test]
    fn test_label_width() {
        let schema = LevelSchema::parse(&["DEBUG", "*INFO", "CRITICAL"]).unwrap();
        assert_eq!(schema.label_width(), 8);
    }
}
