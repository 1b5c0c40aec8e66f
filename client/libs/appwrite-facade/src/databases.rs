//! Document store endpoints and the list-query language
//!
//! Queries are sent as repeated `queries[]` parameters, each a call
//! expression such as `orderDesc("$updatedAt")` or `cursorAfter("abc")`.

use crate::client::{AppwriteClient, UNIQUE_ID};
use crate::models::DocumentList;
use error_types::ClientResult;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;

const SERVICE: &str = "databases";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateDocumentBody<'a, D: ?Sized> {
    document_id: &'a str,
    data: &'a D,
}

#[derive(Serialize)]
struct UpdateDocumentBody<'a, D: ?Sized> {
    data: &'a D,
}

/// One list-query clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentQuery {
    Equal(String, Vec<String>),
    Search(String, String),
    OrderDesc(String),
    Limit(u32),
    CursorAfter(String),
}

impl DocumentQuery {
    pub fn equal(attribute: &str, value: impl Into<String>) -> Self {
        Self::Equal(attribute.to_string(), vec![value.into()])
    }

    pub fn search(attribute: &str, term: impl Into<String>) -> Self {
        Self::Search(attribute.to_string(), term.into())
    }

    pub fn order_desc(attribute: &str) -> Self {
        Self::OrderDesc(attribute.to_string())
    }

    pub fn limit(limit: u32) -> Self {
        Self::Limit(limit)
    }

    pub fn cursor_after(id: impl Into<String>) -> Self {
        Self::CursorAfter(id.into())
    }
}

/// JSON string literal, so quotes in user input stay escaped
fn quoted(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}

fn quoted_list(values: &[String]) -> String {
    let items: Vec<String> = values.iter().map(|v| quoted(v)).collect();
    format!("[{}]", items.join(","))
}

impl fmt::Display for DocumentQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equal(attr, values) => {
                write!(f, "equal({}, {})", quoted(attr), quoted_list(values))
            }
            Self::Search(attr, term) => write!(
                f,
                "search({}, {})",
                quoted(attr),
                quoted_list(std::slice::from_ref(term))
            ),
            Self::OrderDesc(attr) => write!(f, "orderDesc({})", quoted(attr)),
            Self::Limit(limit) => write!(f, "limit({})", limit),
            Self::CursorAfter(id) => write!(f, "cursorAfter({})", quoted(id)),
        }
    }
}

impl AppwriteClient {
    fn collection_path(&self, collection_id: &str) -> String {
        format!(
            "/databases/{}/collections/{}/documents",
            self.config().database_id,
            collection_id
        )
    }

    fn document_path(&self, collection_id: &str, document_id: &str) -> String {
        format!("{}/{}", self.collection_path(collection_id), document_id)
    }

    /// Create a document with a backend-generated id
    pub async fn create_document<D: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        collection_id: &str,
        data: &D,
    ) -> ClientResult<T> {
        self.post(
            SERVICE,
            &self.collection_path(collection_id),
            &CreateDocumentBody {
                document_id: UNIQUE_ID,
                data,
            },
        )
        .await
    }

    pub async fn get_document<T: DeserializeOwned>(
        &self,
        collection_id: &str,
        document_id: &str,
    ) -> ClientResult<T> {
        self.get(SERVICE, &self.document_path(collection_id, document_id), &[])
            .await
    }

    /// Partial update of the given attributes
    pub async fn update_document<D: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        collection_id: &str,
        document_id: &str,
        data: &D,
    ) -> ClientResult<T> {
        self.patch(
            SERVICE,
            &self.document_path(collection_id, document_id),
            &UpdateDocumentBody { data },
        )
        .await
    }

    pub async fn delete_document(&self, collection_id: &str, document_id: &str) -> ClientResult<()> {
        self.delete(SERVICE, &self.document_path(collection_id, document_id))
            .await
    }

    pub async fn list_documents<T: DeserializeOwned>(
        &self,
        collection_id: &str,
        queries: &[DocumentQuery],
    ) -> ClientResult<DocumentList<T>> {
        let params: Vec<(&str, String)> = queries
            .iter()
            .map(|query| ("queries[]", query.to_string()))
            .collect();
        self.get(SERVICE, &self.collection_path(collection_id), &params)
            .await
    }
}
