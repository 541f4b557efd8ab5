//! Flat iteration over paginated query results.

use caselog_store::{Cursor, StoredDocument};
use tracing::warn;

/// Lazy, flat iterator over every document behind a cursor.
///
/// Pages are requested transparently as the previous one drains; iteration
/// ends at the first empty page and stays ended. A page retrieval failure
/// (an expired cursor, a store error) is reported and terminates iteration
/// rather than escalating.
pub struct Hits {
    cursor: Box<dyn Cursor>,
    page: std::vec::IntoIter<StoredDocument>,
    exhausted: bool,
}

impl Hits {
    /// Wrap a freshly opened cursor.
    pub fn new(cursor: Box<dyn Cursor>) -> Self {
        Hits {
            cursor,
            page: Vec::new().into_iter(),
            exhausted: false,
        }
    }
}

impl Iterator for Hits {
    type Item = StoredDocument;

    fn next(&mut self) -> Option<StoredDocument> {
        loop {
            if let Some(doc) = self.page.next() {
                return Some(doc);
            }
            if self.exhausted {
                return None;
            }
            match self.cursor.next_page() {
                Ok(page) if page.is_empty() => {
                    self.exhausted = true;
                    return None;
                }
                Ok(page) => self.page = page.into_iter(),
                Err(e) => {
                    warn!(error = %e, "page retrieval failed; stopping iteration");
                    self.exhausted = true;
                    return None;
                }
            }
        }
    }
}
