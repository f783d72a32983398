//! Record Fetcher
//!
//! Reads the three record sets a report needs. Pure read: no retries, no
//! pagination, no transformation. A store failure aborts the run.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use trackpd_common::models::DocumentKey;
use trackpd_common::store::subcollection_path;
use trackpd_common::{Document, StoreClient};

/// Read side of the document store
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// One document by key; `None` when absent
    async fn fetch_profile(&self, key: &DocumentKey) -> trackpd_common::Result<Option<Document>>;

    /// Every document of a collection, in store traversal order
    async fn fetch_collection(&self, collection: &str) -> trackpd_common::Result<Vec<Document>>;
}

#[async_trait]
impl RecordSource for StoreClient {
    async fn fetch_profile(&self, key: &DocumentKey) -> trackpd_common::Result<Option<Document>> {
        self.get_document(key).await
    }

    async fn fetch_collection(&self, collection: &str) -> trackpd_common::Result<Vec<Document>> {
        self.list_collection(collection).await
    }
}

/// Whose report is being generated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSubject {
    /// Profile document id
    pub profile_id: String,
    /// Owner document of the activity subcollection
    pub activity_owner: String,
}

/// Collection names the locators are built from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionNames {
    pub users: String,
    pub activity: String,
    pub tremors: String,
}

impl Default for CollectionNames {
    fn default() -> Self {
        Self {
            users: "users".to_string(),
            activity: "activity".to_string(),
            tremors: "tremors".to_string(),
        }
    }
}

/// Store locations of one report's inputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordLocators {
    pub profile: DocumentKey,
    pub activities: String,
    pub tremors: String,
}

impl RecordLocators {
    pub fn for_subject(subject: &ReportSubject, names: &CollectionNames) -> Self {
        Self {
            profile: DocumentKey::new(&names.users, &subject.profile_id),
            activities: subcollection_path(&names.users, &subject.activity_owner, &names.activity),
            // Tremor samples are read for the whole collection, not per subject
            tremors: names.tremors.clone(),
        }
    }
}

/// Raw inputs of one regeneration run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchedRecords {
    pub profile: Document,
    pub activities: Vec<Document>,
    pub tremors: Vec<Document>,
}

/// Fetch the profile, the activity events and the tremor samples
pub async fn fetch_records(
    source: &dyn RecordSource,
    locators: &RecordLocators,
) -> Result<FetchedRecords> {
    let profile = match source.fetch_profile(&locators.profile).await? {
        Some(doc) => doc,
        None => {
            warn!(
                "Profile {} not found; table will render empty cells",
                locators.profile
            );
            Document::new()
        }
    };
    let activities = source.fetch_collection(&locators.activities).await?;
    let tremors = source.fetch_collection(&locators.tremors).await?;

    debug!(
        "Fetched profile {} ({} fields), {} activity events, {} tremor samples",
        locators.profile,
        profile.len(),
        activities.len(),
        tremors.len()
    );

    Ok(FetchedRecords {
        profile,
        activities,
        tremors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn subject() -> ReportSubject {
        ReportSubject {
            profile_id: "p1".to_string(),
            activity_owner: "o1".to_string(),
        }
    }

    #[test]
    fn test_locators_for_subject() {
        let locators = RecordLocators::for_subject(&subject(), &CollectionNames::default());
        assert_eq!(locators.profile, DocumentKey::new("users", "p1"));
        assert_eq!(locators.activities, "users/o1/activity");
        assert_eq!(locators.tremors, "tremors");
    }

    #[tokio::test]
    async fn test_fetch_from_store() {
        let store = StoreClient::open_in_memory().await.unwrap();
        let locators = RecordLocators::for_subject(&subject(), &CollectionNames::default());

        let profile = json!({"name": "Ada"}).as_object().cloned().unwrap();
        store.set_document(&locators.profile, &profile).await.unwrap();
        let event = json!({"activityType": "Walking"}).as_object().cloned().unwrap();
        store.add_document(&locators.activities, &event).await.unwrap();

        let records = fetch_records(&store, &locators).await.unwrap();
        assert_eq!(records.profile["name"], "Ada");
        assert_eq!(records.activities.len(), 1);
        assert!(records.tremors.is_empty());
    }

    #[tokio::test]
    async fn test_missing_profile_is_empty_mapping() {
        let store = StoreClient::open_in_memory().await.unwrap();
        let locators = RecordLocators::for_subject(&subject(), &CollectionNames::default());

        let records = fetch_records(&store, &locators).await.unwrap();
        assert!(records.profile.is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_aborts() {
        let store = StoreClient::open_in_memory().await.unwrap();
        store.close().await;
        let locators = RecordLocators::for_subject(&subject(), &CollectionNames::default());

        assert!(fetch_records(&store, &locators).await.is_err());
    }
}
