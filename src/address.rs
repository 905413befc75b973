//! Content addresses for the two tables.
//!
//! Every data operation is routed from a URI of the form
//! `content://{authority}/{table}` or `content://{authority}/{table}/{id}`.
//! The [`Router`] is built once at start-up and only ever read afterwards.

use std::collections::HashMap;
use std::fmt;

use url::Url;

use crate::db::error::{Result, StoreError};

pub const SCHEME: &str = "content";
pub const DEFAULT_AUTHORITY: &str = "episodes.db.ShowsProvider";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Table {
    Shows,
    Episodes,
}

impl Table {
    pub fn name(self) -> &'static str {
        match self {
            Table::Shows => "shows",
            Table::Episodes => "episodes",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AddressKind {
    ShowCollection,
    ShowItem,
    EpisodeCollection,
    EpisodeItem,
}

impl AddressKind {
    pub fn table(self) -> Table {
        match self {
            AddressKind::ShowCollection | AddressKind::ShowItem => Table::Shows,
            AddressKind::EpisodeCollection | AddressKind::EpisodeItem => Table::Episodes,
        }
    }

    pub fn is_item(self) -> bool {
        matches!(self, AddressKind::ShowItem | AddressKind::EpisodeItem)
    }
}

/// A resolved address: a table, optionally narrowed to one row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Address {
    pub table: Table,
    pub id: Option<i32>,
}

impl Address {
    pub fn collection(table: Table) -> Self {
        Address { table, id: None }
    }

    pub fn item(table: Table, id: i32) -> Self {
        Address {
            table,
            id: Some(id),
        }
    }

    pub fn kind(&self) -> AddressKind {
        match (self.table, self.id) {
            (Table::Shows, None) => AddressKind::ShowCollection,
            (Table::Shows, Some(_)) => AddressKind::ShowItem,
            (Table::Episodes, None) => AddressKind::EpisodeCollection,
            (Table::Episodes, Some(_)) => AddressKind::EpisodeItem,
        }
    }

    /// True when one address is a prefix of (or equal to) the other.
    pub fn overlaps(&self, other: &Address) -> bool {
        if self.table != other.table {
            return false;
        }
        match (self.id, other.id) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "{}/{}", self.table.name(), id),
            None => write!(f, "{}", self.table.name()),
        }
    }
}

/// Maps URI shapes to address kinds for a single authority.
#[derive(Debug)]
pub struct Router {
    authority: String,
    routes: HashMap<(&'static str, bool), AddressKind>,
}

impl Router {
    /// A router for `authority`, which must be usable as the host of a
    /// content URI.
    pub fn new(authority: impl Into<String>) -> Result<Self> {
        let authority = authority.into();
        let sample = format!("{}://{}/{}", SCHEME, authority, Table::Shows.name());
        let invalid = |reason: &'static str| StoreError::InvalidAddress {
            address: sample.clone(),
            reason,
        };
        if authority.is_empty() {
            return Err(invalid("empty authority"));
        }
        let parsed = Url::parse(&sample).map_err(|_| invalid("malformed authority"))?;
        if parsed.host_str() != Some(authority.as_str()) || parsed.port().is_some() {
            return Err(invalid("authority is not a plain host name"));
        }
        Ok(Self::unchecked(authority))
    }

    fn unchecked(authority: String) -> Self {
        let routes = HashMap::from([
            ((Table::Shows.name(), false), AddressKind::ShowCollection),
            ((Table::Shows.name(), true), AddressKind::ShowItem),
            ((Table::Episodes.name(), false), AddressKind::EpisodeCollection),
            ((Table::Episodes.name(), true), AddressKind::EpisodeItem),
        ]);

        Router { authority, routes }
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Resolve a URI into an [`Address`], failing with
    /// [`StoreError::InvalidAddress`] for anything that is not one of the
    /// four known shapes.
    pub fn resolve(&self, uri: &Url) -> Result<Address> {
        let invalid = |reason: &'static str| StoreError::InvalidAddress {
            address: uri.to_string(),
            reason,
        };

        if uri.scheme() != SCHEME {
            return Err(invalid("unknown scheme"));
        }
        if uri.host_str() != Some(self.authority.as_str()) {
            return Err(invalid("unknown authority"));
        }
        if uri.query().is_some() || uri.fragment().is_some() {
            return Err(invalid("unexpected query or fragment"));
        }

        let segments: Vec<&str> = uri
            .path_segments()
            .map(|segments| segments.collect())
            .unwrap_or_default();

        let (table, id) = match segments.as_slice() {
            [table] => (*table, None),
            [table, id] => {
                // same rule as a `#` wildcard: digits only
                if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(invalid("row id is not a number"));
                }
                let id = id.parse::<i32>().map_err(|_| invalid("row id out of range"))?;
                (*table, Some(id))
            }
            _ => return Err(invalid("unexpected path")),
        };

        let kind = self
            .routes
            .get(&(table, id.is_some()))
            .ok_or_else(|| invalid("unknown table"))?;

        Ok(Address {
            table: kind.table(),
            id,
        })
    }

    pub fn uri(&self, address: &Address) -> Url {
        let text = format!("{}://{}/{}", SCHEME, self.authority, address);
        // the authority was checked in `new` and table names are fixed ascii
        Url::parse(&text).unwrap_or_else(|_| unreachable!("malformed content uri {text}"))
    }

    pub fn shows(&self) -> Url {
        self.uri(&Address::collection(Table::Shows))
    }

    pub fn show(&self, id: i32) -> Url {
        self.uri(&Address::item(Table::Shows, id))
    }

    pub fn episodes(&self) -> Url {
        self.uri(&Address::collection(Table::Episodes))
    }

    pub fn episode(&self, id: i32) -> Url {
        self.uri(&Address::item(Table::Episodes, id))
    }
}

impl Default for Router {
    fn default() -> Self {
        Router::unchecked(DEFAULT_AUTHORITY.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Url {
        Url::parse(text).unwrap()
    }

    #[test]
    fn resolves_the_four_shapes() {
        let router = Router::default();

        let shows = router.resolve(&router.shows()).unwrap();
        assert_eq!(shows.kind(), AddressKind::ShowCollection);

        let show = router.resolve(&router.show(12)).unwrap();
        assert_eq!(show.kind(), AddressKind::ShowItem);
        assert_eq!(show.id, Some(12));

        let episodes = router.resolve(&router.episodes()).unwrap();
        assert_eq!(episodes.kind(), AddressKind::EpisodeCollection);

        let episode = router.resolve(&router.episode(3)).unwrap();
        assert_eq!(episode.kind(), AddressKind::EpisodeItem);
    }

    #[test]
    fn rejects_unknown_shapes() {
        let router = Router::default();
        let bad = [
            "content://episodes.db.ShowsProvider/seasons",
            "content://episodes.db.ShowsProvider/shows/abc",
            "content://episodes.db.ShowsProvider/shows/1/episodes",
            "content://someone.else/shows",
            "http://episodes.db.ShowsProvider/shows",
            "content://episodes.db.ShowsProvider/shows/-1",
        ];

        for text in bad {
            let err = router.resolve(&parse(text)).unwrap_err();
            assert!(
                matches!(err, StoreError::InvalidAddress { .. }),
                "{text} resolved"
            );
        }
    }

    #[test]
    fn uri_round_trips() {
        let router = Router::new("tests.provider").unwrap();
        let address = Address::item(Table::Episodes, 44);
        let uri = router.uri(&address);
        assert_eq!(uri.as_str(), "content://tests.provider/episodes/44");
        assert_eq!(router.resolve(&uri).unwrap(), address);
    }

    #[test]
    fn rejects_authorities_that_are_not_hosts() {
        for authority in ["my shows", "", "user@host", "host:8080", "a/b"] {
            assert!(
                matches!(Router::new(authority), Err(StoreError::InvalidAddress { .. })),
                "{authority:?} accepted"
            );
        }
        assert_eq!(
            Router::new(DEFAULT_AUTHORITY).unwrap().shows(),
            Router::default().shows()
        );
    }

    #[test]
    fn overlap_follows_prefixes() {
        let shows = Address::collection(Table::Shows);
        let show_1 = Address::item(Table::Shows, 1);
        let show_2 = Address::item(Table::Shows, 2);
        let episodes = Address::collection(Table::Episodes);

        assert!(shows.overlaps(&show_1));
        assert!(show_1.overlaps(&shows));
        assert!(!show_1.overlaps(&show_2));
        assert!(!shows.overlaps(&episodes));
    }
}
