//! crates/feedback_coach_core/src/documents.rs
//!
//! Owner-scoped document operations. Every call takes the authenticated user's
//! id; a document belonging to someone else is reported exactly like a missing
//! one.

use std::sync::{Arc, OnceLock};

use regex::Regex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::{Document, DocumentSummary};
use crate::ports::{DocumentStore, PortError, PortResult};

/// Largest accepted document, in UTF-8 bytes.
pub const MAX_DOCUMENT_BYTES: usize = 1024 * 1024;

/// The only content type accepted on upload.
pub const PLAIN_TEXT: &str = "text/plain";

/// Reported both for missing documents and for documents owned by someone else.
pub const NOT_FOUND: &str = "Document not found or access denied";

pub struct DocumentService {
    store: Arc<dyn DocumentStore>,
}

impl DocumentService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Validates and stores an uploaded file, using its filename as the title.
    ///
    /// Checks run in a fixed order and the first failure is reported: content
    /// type and extension, UTF-8 decoding, size, then title uniqueness.
    pub async fn upload(
        &self,
        user_id: Uuid,
        filename: &str,
        content_type: Option<&str>,
        raw_bytes: &[u8],
    ) -> PortResult<Uuid> {
        if content_type != Some(PLAIN_TEXT) {
            return Err(PortError::InvalidInput(
                "Only plain text (text/plain) files are allowed".to_string(),
            ));
        }
        if !filename.to_ascii_lowercase().ends_with(".txt") {
            return Err(PortError::InvalidInput(
                "Only .txt files are allowed".to_string(),
            ));
        }
        let content = std::str::from_utf8(raw_bytes).map_err(|_| {
            PortError::InvalidInput("File must be a valid UTF-8 text file".to_string())
        })?;
        if raw_bytes.len() > MAX_DOCUMENT_BYTES {
            return Err(PortError::TooLarge("File size exceeds 1MB limit".to_string()));
        }
        if self.store.exists_title_for_user(user_id, filename).await? {
            debug!(user_id = %user_id, "Upload rejected: duplicate title");
            return Err(duplicate_title(filename));
        }

        let document_id = self
            .store
            .insert(user_id, filename, content)
            .await
            .map_err(|e| match e {
                PortError::Conflict(_) => duplicate_title(filename),
                other => other,
            })?;
        info!(user_id = %user_id, document_id = %document_id, bytes = raw_bytes.len(), "Document uploaded");
        Ok(document_id)
    }

    /// The number to use for the next `Untitled N.txt` document.
    pub async fn next_untitled_number(&self, user_id: Uuid) -> PortResult<u64> {
        let documents = self.store.list_for_user(user_id).await?;
        next_untitled_from_titles(documents.iter().map(|d| d.title.as_str()))
    }

    pub async fn title_exists(&self, user_id: Uuid, title: &str) -> PortResult<bool> {
        self.store.exists_title_for_user(user_id, title).await
    }

    pub async fn list(&self, user_id: Uuid) -> PortResult<Vec<DocumentSummary>> {
        self.store.list_for_user(user_id).await
    }

    pub async fn get(&self, user_id: Uuid, document_id: Uuid) -> PortResult<Document> {
        self.store
            .get(document_id, user_id)
            .await?
            .ok_or_else(not_found)
    }

    /// Replaces the content of an owned document.
    pub async fn update_content(
        &self,
        user_id: Uuid,
        document_id: Uuid,
        content: &str,
    ) -> PortResult<()> {
        if content.len() > MAX_DOCUMENT_BYTES {
            return Err(PortError::TooLarge(format!(
                "Document content exceeds 1MB limit. Current size: {} bytes",
                content.len()
            )));
        }
        if !self.store.update_content(document_id, user_id, content).await? {
            return Err(not_found());
        }
        info!(user_id = %user_id, document_id = %document_id, "Document updated");
        Ok(())
    }

    /// Renames an owned document and returns the stored (trimmed) title.
    pub async fn rename(
        &self,
        user_id: Uuid,
        document_id: Uuid,
        new_title: &str,
    ) -> PortResult<String> {
        let title = new_title.trim();
        if title.is_empty() {
            return Err(PortError::InvalidInput(
                "Document title cannot be empty".to_string(),
            ));
        }
        let renamed = self
            .store
            .rename(document_id, user_id, title)
            .await
            .map_err(|e| match e {
                PortError::Conflict(_) => duplicate_title(title),
                other => other,
            })?;
        if !renamed {
            return Err(not_found());
        }
        info!(user_id = %user_id, document_id = %document_id, "Document renamed");
        Ok(title.to_string())
    }

    /// Deletes an owned document and returns the removed record.
    pub async fn delete(&self, user_id: Uuid, document_id: Uuid) -> PortResult<Document> {
        let deleted = self
            .store
            .delete(document_id, user_id)
            .await?
            .ok_or_else(not_found)?;
        info!(user_id = %user_id, document_id = %document_id, "Document deleted");
        Ok(deleted)
    }
}

fn not_found() -> PortError {
    PortError::NotFound(NOT_FOUND.to_string())
}

fn duplicate_title(title: &str) -> PortError {
    PortError::Conflict(format!(
        "A document with the name '{}' already exists. Please choose a different name.",
        title
    ))
}

fn untitled_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^Untitled ([0-9]+)\.txt$").expect("untitled pattern is a valid regex")
    })
}

/// Returns the digits `N` of a title of the exact form `Untitled N.txt`.
pub fn untitled_digits(title: &str) -> Option<&str> {
    untitled_pattern()
        .captures(title)
        .and_then(|caps| caps.get(1))
        .map(|n| n.as_str())
}

/// One past the largest `Untitled N.txt` number among `titles`, or 1 if none match.
///
/// Fails with `InvalidInput` when that successor does not fit in a `u64`,
/// including when a matching title's number is already out of range.
pub fn next_untitled_from_titles<'a, I>(titles: I) -> PortResult<u64>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut max: Option<u64> = None;
    for digits in titles.into_iter().filter_map(untitled_digits) {
        let n: u64 = digits.parse().map_err(|_| untitled_range_exhausted())?;
        max = max.max(Some(n));
    }
    match max {
        None => Ok(1),
        Some(n) => n.checked_add(1).ok_or_else(untitled_range_exhausted),
    }
}

fn untitled_range_exhausted() -> PortError {
    PortError::InvalidInput(
        "No further 'Untitled N.txt' number is available; rename an existing untitled document"
            .to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::MockDocumentStore;
    use chrono::Utc;
    use rstest::rstest;

    const OWNER: Uuid = Uuid::from_u128(1);
    const DOC: Uuid = Uuid::from_u128(42);

    fn summary(title: &str) -> DocumentSummary {
        DocumentSummary {
            id: Uuid::new_v4(),
            title: title.to_string(),
            created_at: Utc::now(),
        }
    }

    fn service(store: MockDocumentStore) -> DocumentService {
        DocumentService::new(Arc::new(store))
    }

    #[rstest]
    #[case("Untitled 1.txt", Some("1"))]
    #[case("Untitled 12.txt", Some("12"))]
    #[case("Untitled 007.txt", Some("007"))]
    #[case("Untitled .txt", None)]
    #[case("Untitled -1.txt", None)]
    #[case("Untitled 1.TXT", None)]
    #[case("untitled 1.txt", None)]
    #[case("Untitled 1 copy.txt", None)]
    #[case("My Untitled 1.txt", None)]
    fn matches_only_exact_untitled_titles(#[case] title: &str, #[case] expected: Option<&str>) {
        assert_eq!(untitled_digits(title), expected);
    }

    #[rstest]
    #[case(&[], 1)]
    #[case(&["notes.txt", "Untitled draft.txt"], 1)]
    #[case(&["Untitled 1.txt"], 2)]
    #[case(&["Untitled 1.txt", "Untitled 3.txt", "Untitled 9.txt"], 10)]
    #[case(&["Untitled 2.txt", "notes.txt"], 3)]
    #[case(&["Untitled 007.txt"], 8)]
    #[case(&["Untitled 18446744073709551614.txt"], u64::MAX)]
    fn next_untitled_is_max_plus_one(#[case] titles: &[&str], #[case] expected: u64) {
        assert_eq!(next_untitled_from_titles(titles.iter().copied()), Ok(expected));
    }

    #[rstest]
    #[case(&["Untitled 18446744073709551615.txt"])]
    #[case(&["Untitled 5.txt", "Untitled 100000000000000000000000.txt"])]
    #[case(&["Untitled 100000000000000000000000.txt", "Untitled 5.txt"])]
    fn next_untitled_never_returns_a_taken_or_smaller_number(#[case] titles: &[&str]) {
        let err = next_untitled_from_titles(titles.iter().copied()).unwrap_err();
        assert!(matches!(err, PortError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn next_untitled_number_reads_owner_titles() {
        let mut store = MockDocumentStore::new();
        store
            .expect_list_for_user()
            .withf(|user_id| *user_id == OWNER)
            .returning(|_| Ok(vec![summary("Untitled 1.txt"), summary("Untitled 3.txt")]));

        assert_eq!(service(store).next_untitled_number(OWNER).await, Ok(4));
    }

    #[tokio::test]
    async fn next_untitled_number_reports_exhausted_range() {
        let mut store = MockDocumentStore::new();
        store
            .expect_list_for_user()
            .returning(|_| Ok(vec![summary("Untitled 18446744073709551615.txt")]));

        let err = service(store).next_untitled_number(OWNER).await.unwrap_err();
        assert!(matches!(err, PortError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn upload_stores_valid_text_file() {
        let mut store = MockDocumentStore::new();
        store.expect_exists_title_for_user().returning(|_, _| Ok(false));
        store
            .expect_insert()
            .withf(|user_id, title, content| {
                *user_id == OWNER && title == "Untitled 1.txt" && content == "hello"
            })
            .times(1)
            .returning(|_, _, _| Ok(DOC));

        let id = service(store)
            .upload(OWNER, "Untitled 1.txt", Some("text/plain"), b"hello")
            .await
            .unwrap();
        assert_eq!(id, DOC);
    }

    #[tokio::test]
    async fn upload_accepts_uppercase_extension() {
        let mut store = MockDocumentStore::new();
        store.expect_exists_title_for_user().returning(|_, _| Ok(false));
        store.expect_insert().returning(|_, _, _| Ok(DOC));

        let result = service(store)
            .upload(OWNER, "NOTES.TXT", Some("text/plain"), b"hi")
            .await;
        assert_eq!(result, Ok(DOC));
    }

    #[rstest]
    #[case(None)]
    #[case(Some("text/html"))]
    #[case(Some("application/octet-stream"))]
    #[case(Some("text/plain; charset=utf-8"))]
    #[tokio::test]
    async fn upload_rejects_wrong_content_type(#[case] content_type: Option<&str>) {
        let mut store = MockDocumentStore::new();
        store.expect_exists_title_for_user().never();
        store.expect_insert().never();

        let err = service(store)
            .upload(OWNER, "a.txt", content_type, b"hello")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            PortError::InvalidInput("Only plain text (text/plain) files are allowed".to_string())
        );
    }

    #[tokio::test]
    async fn upload_rejects_wrong_extension() {
        let err = service(MockDocumentStore::new())
            .upload(OWNER, "a.md", Some("text/plain"), b"hello")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            PortError::InvalidInput("Only .txt files are allowed".to_string())
        );
    }

    #[tokio::test]
    async fn upload_rejects_invalid_utf8() {
        let err = service(MockDocumentStore::new())
            .upload(OWNER, "a.txt", Some("text/plain"), &[0x66, 0xff, 0xfe])
            .await
            .unwrap_err();
        assert_eq!(
            err,
            PortError::InvalidInput("File must be a valid UTF-8 text file".to_string())
        );
    }

    #[tokio::test]
    async fn upload_rejects_oversize_file() {
        let mut store = MockDocumentStore::new();
        store.expect_exists_title_for_user().never();
        let body = vec![b'a'; MAX_DOCUMENT_BYTES + 1];

        let err = service(store)
            .upload(OWNER, "a.txt", Some("text/plain"), &body)
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::TooLarge(_)));
    }

    #[tokio::test]
    async fn upload_accepts_exactly_one_mebibyte() {
        let mut store = MockDocumentStore::new();
        store.expect_exists_title_for_user().returning(|_, _| Ok(false));
        store.expect_insert().returning(|_, _, _| Ok(DOC));
        let body = vec![b'a'; MAX_DOCUMENT_BYTES];

        let result = service(store)
            .upload(OWNER, "a.txt", Some("text/plain"), &body)
            .await;
        assert_eq!(result, Ok(DOC));
    }

    #[tokio::test]
    async fn upload_reports_first_failing_check() {
        let mut body = vec![b'a'; MAX_DOCUMENT_BYTES + 1];
        body[0] = 0xff;

        let err = service(MockDocumentStore::new())
            .upload(OWNER, "a.bin", Some("image/png"), &body)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            PortError::InvalidInput("Only plain text (text/plain) files are allowed".to_string())
        );

        let err = service(MockDocumentStore::new())
            .upload(OWNER, "a.txt", Some("text/plain"), &body)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            PortError::InvalidInput("File must be a valid UTF-8 text file".to_string())
        );
    }

    #[tokio::test]
    async fn upload_rejects_duplicate_title() {
        let mut store = MockDocumentStore::new();
        store
            .expect_exists_title_for_user()
            .withf(|user_id, title| *user_id == OWNER && title == "a.txt")
            .returning(|_, _| Ok(true));
        store.expect_insert().never();

        let err = service(store)
            .upload(OWNER, "a.txt", Some("text/plain"), b"hello")
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::Conflict(_)));
    }

    #[tokio::test]
    async fn upload_maps_constraint_race_to_conflict() {
        let mut store = MockDocumentStore::new();
        store.expect_exists_title_for_user().returning(|_, _| Ok(false));
        store
            .expect_insert()
            .returning(|_, _, _| Err(PortError::Conflict("unique violation".to_string())));

        let err = service(store)
            .upload(OWNER, "a.txt", Some("text/plain"), b"hello")
            .await
            .unwrap_err();
        assert_eq!(err, duplicate_title("a.txt"));
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("\t\n")]
    #[tokio::test]
    async fn rename_rejects_blank_title(#[case] title: &str) {
        let mut store = MockDocumentStore::new();
        store.expect_rename().never();

        let err = service(store).rename(OWNER, DOC, title).await.unwrap_err();
        assert!(matches!(err, PortError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn rename_trims_title() {
        let mut store = MockDocumentStore::new();
        store
            .expect_rename()
            .withf(|doc, user, title| *doc == DOC && *user == OWNER && title == "notes.txt")
            .returning(|_, _, _| Ok(true));

        let title = service(store).rename(OWNER, DOC, "  notes.txt ").await;
        assert_eq!(title, Ok("notes.txt".to_string()));
    }

    #[tokio::test]
    async fn update_content_rejects_oversize_content() {
        let mut store = MockDocumentStore::new();
        store.expect_update_content().never();
        let content = "é".repeat(MAX_DOCUMENT_BYTES / 2 + 1);

        let err = service(store)
            .update_content(OWNER, DOC, &content)
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::TooLarge(_)));
    }

    // A foreign document and a missing one must look the same to the caller.
    #[tokio::test]
    async fn unowned_documents_are_not_found() {
        let mut store = MockDocumentStore::new();
        store.expect_get().returning(|_, _| Ok(None));
        store.expect_update_content().returning(|_, _, _| Ok(false));
        store.expect_rename().returning(|_, _, _| Ok(false));
        store.expect_delete().returning(|_, _| Ok(None));
        let documents = service(store);
        let expected = PortError::NotFound(NOT_FOUND.to_string());

        assert_eq!(documents.get(OWNER, DOC).await, Err(expected.clone()));
        assert_eq!(
            documents.update_content(OWNER, DOC, "x").await,
            Err(expected.clone())
        );
        assert_eq!(
            documents.rename(OWNER, DOC, "x.txt").await,
            Err(expected.clone())
        );
        assert_eq!(documents.delete(OWNER, DOC).await, Err(expected));
    }

    #[tokio::test]
    async fn delete_returns_removed_document() {
        let mut store = MockDocumentStore::new();
        store.expect_delete().returning(|doc, user| {
            Ok(Some(Document {
                id: doc,
                user_id: user,
                title: "notes.txt".to_string(),
                content: "hello".to_string(),
                created_at: Utc::now(),
            }))
        });

        let deleted = service(store).delete(OWNER, DOC).await.unwrap();
        assert_eq!(deleted.title, "notes.txt");
    }

    #[tokio::test]
    async fn store_failures_propagate() {
        let mut store = MockDocumentStore::new();
        store
            .expect_list_for_user()
            .returning(|_| Err(PortError::Internal("connection refused".to_string())));

        let err = service(store).list(OWNER).await.unwrap_err();
        assert!(matches!(err, PortError::Internal(_)));
    }
}
