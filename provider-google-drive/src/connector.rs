//! Google Drive API connector
//!
//! Read-only Drive v3 client for the wiki: folder listings with the wiki's
//! field projection and single-file metadata lookups. The connector holds
//! the current bearer token in a swappable slot fed by the session manager
//! through [`TokenSink`].

use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
use core_runtime::config::DEFAULT_FILE_FIELDS;
use core_runtime::events::{CoreEvent, DriveEvent, EventBus};
use core_session::TokenSink;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::error::{DriveError, Result};
use crate::types::{DriveFile, FileListResponse};

/// Google Drive API base URL
const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// Maximum results per page (Google Drive API limit)
const MAX_PAGE_SIZE: u32 = 1000;

/// Field projection for a single file resource
const FILE_FIELDS: &str = "properties, appProperties, name, id, driveId, parents, mimeType, \
     modifiedTime, createdTime, lastModifyingUser(displayName, photoLink), iconLink, \
     webViewLink, shortcutDetails, capabilities, starred";

/// Google Drive API connector
///
/// All requests carry the API key and the bearer token last applied via
/// [`TokenSink`]; calls made before a token is applied fail with
/// [`DriveError::NotAuthenticated`].
pub struct DriveConnector {
    http_client: Arc<dyn HttpClient>,
    api_key: String,
    event_bus: EventBus,
    access_token: RwLock<Option<String>>,
}

impl DriveConnector {
    pub fn new(http_client: Arc<dyn HttpClient>, api_key: String, event_bus: EventBus) -> Self {
        Self {
            http_client,
            api_key,
            event_bus,
            access_token: RwLock::new(None),
        }
    }

    /// Lists one page of the direct children of a folder.
    ///
    /// Trashed files are excluded. Returns the files and the token for the
    /// next page, if any.
    #[instrument(skip(self), fields(folder_id = %folder_id))]
    pub async fn list_folder(
        &self,
        folder_id: &str,
        page_token: Option<&str>,
    ) -> Result<(Vec<DriveFile>, Option<String>)> {
        self.emit(DriveEvent::ListingStarted {
            folder_id: folder_id.to_string(),
        });

        match self.list_folder_inner(folder_id, page_token).await {
            Ok((files, next)) => {
                self.emit(DriveEvent::ListingCompleted {
                    folder_id: folder_id.to_string(),
                    file_count: files.len(),
                });
                Ok((files, next))
            }
            Err(e) => {
                self.emit_failure(&e);
                Err(e)
            }
        }
    }

    /// Lists all direct children of a folder, following pagination.
    pub async fn list_folder_all(&self, folder_id: &str) -> Result<Vec<DriveFile>> {
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let (mut page, next) = self.list_folder(folder_id, page_token.as_deref()).await?;
            files.append(&mut page);
            match next {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        info!(folder_id, file_count = files.len(), "Folder fully listed");
        Ok(files)
    }

    /// Fetches metadata for a single file.
    #[instrument(skip(self), fields(file_id = %file_id))]
    pub async fn get_file(&self, file_id: &str) -> Result<DriveFile> {
        let url = format!(
            "{}/files/{}?fields={}&supportsAllDrives=true&key={}",
            DRIVE_API_BASE,
            urlencoding::encode(file_id),
            urlencoding::encode(FILE_FIELDS),
            self.api_key
        );

        let result = self.get_json(url).await.and_then(|response| {
            response
                .json::<DriveFile>()
                .map_err(|e| DriveError::Parse(e.to_string()))
        });

        match result {
            Ok(file) => Ok(file),
            Err(DriveError::ApiError {
                status_code: 404, ..
            }) => {
                let e = DriveError::FileNotFound {
                    file_id: file_id.to_string(),
                };
                self.emit_failure(&e);
                Err(e)
            }
            Err(e) => {
                self.emit_failure(&e);
                Err(e)
            }
        }
    }

    async fn list_folder_inner(
        &self,
        folder_id: &str,
        page_token: Option<&str>,
    ) -> Result<(Vec<DriveFile>, Option<String>)> {
        let query = format!("'{}' in parents and trashed = false", folder_id);

        let mut url = format!(
            "{}/files?q={}&pageSize={}&fields={}&supportsAllDrives=true&includeItemsFromAllDrives=true&key={}",
            DRIVE_API_BASE,
            urlencoding::encode(&query),
            MAX_PAGE_SIZE,
            urlencoding::encode(DEFAULT_FILE_FIELDS),
            self.api_key
        );
        if let Some(token) = page_token {
            url.push_str(&format!("&pageToken={}", urlencoding::encode(token)));
        }

        let response = self.get_json(url).await?;
        let listing: FileListResponse = response
            .json()
            .map_err(|e| DriveError::Parse(e.to_string()))?;

        if listing.incomplete_search {
            warn!(folder_id, "Drive reported an incomplete search");
        }
        debug!(folder_id, file_count = listing.files.len(), "Page listed");

        Ok((listing.files, listing.next_page_token))
    }

    /// Executes an authenticated GET and maps non-2xx statuses to errors.
    async fn get_json(&self, url: String) -> Result<HttpResponse> {
        let token = self.bearer()?;

        let request = HttpRequest::new(HttpMethod::Get, url)
            .bearer_token(token)
            .header("Accept", "application/json")
            .timeout(Duration::from_secs(30));

        let response = self
            .http_client
            .execute_with_retry(request, RetryPolicy::default())
            .await?;

        if !response.is_success() {
            return Err(DriveError::ApiError {
                status_code: response.status,
                message: String::from_utf8_lossy(&response.body).to_string(),
            });
        }
        Ok(response)
    }

    fn bearer(&self) -> Result<String> {
        let slot = match self.access_token.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        slot.clone().ok_or(DriveError::NotAuthenticated)
    }

    fn emit_failure(&self, error: &DriveError) {
        warn!(error = %error, "Drive request failed");
        self.emit(DriveEvent::RequestFailed {
            message: error.to_string(),
            recoverable: error.is_recoverable(),
        });
    }

    fn emit(&self, event: DriveEvent) {
        let _ = self.event_bus.emit(CoreEvent::Drive(event));
    }
}

impl TokenSink for DriveConnector {
    fn apply_token(&self, access_token: &str) {
        let mut slot = match self.access_token.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *slot = Some(access_token.to_string());
        debug!("Access token applied to Drive connector");
    }

    fn clear_token(&self) {
        let mut slot = match self.access_token.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *slot = None;
        debug!("Access token cleared from Drive connector");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use mockall::mock;
    use std::collections::HashMap;

    mock! {
        HttpClient {}

        #[async_trait::async_trait]
        impl HttpClient for HttpClient {
            async fn execute(
                &self,
                request: HttpRequest,
            ) -> bridge_traits::error::Result<HttpResponse>;
        }
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: HashMap::new(),
            body: Bytes::from(body.as_bytes().to_vec()),
        }
    }

    fn connector(mock_http: MockHttpClient) -> DriveConnector {
        DriveConnector::new(
            Arc::new(mock_http),
            "test-api-key".to_string(),
            EventBus::default(),
        )
    }

    #[tokio::test]
    async fn test_list_folder_success() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|req| {
            assert!(req.headers.contains_key("Authorization"));
            assert!(req.url.contains("key=test-api-key"));
            assert!(req.url.contains("trashed%20%3D%20false"));

            Ok(response(
                200,
                r#"{
                    "files": [
                        {
                            "id": "file1",
                            "name": "Home",
                            "mimeType": "application/vnd.google-apps.document",
                            "parents": ["root1"]
                        }
                    ],
                    "nextPageToken": "next_page"
                }"#,
            ))
        });

        let connector = connector(mock_http);
        connector.apply_token("tok");

        let (files, next) = connector.list_folder("root1", None).await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "Home");
        assert_eq!(next.as_deref(), Some("next_page"));
    }

    #[tokio::test]
    async fn test_list_folder_all_follows_pagination() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(2).returning(|req| {
            if req.url.contains("pageToken") {
                assert!(req.url.contains("pageToken=page2"));
                Ok(response(
                    200,
                    r#"{"files": [{"id": "b", "name": "B", "mimeType": "text/plain"}]}"#,
                ))
            } else {
                Ok(response(
                    200,
                    r#"{
                        "files": [{"id": "a", "name": "A", "mimeType": "text/plain"}],
                        "nextPageToken": "page2"
                    }"#,
                ))
            }
        });

        let connector = connector(mock_http);
        connector.apply_token("tok");

        let files = connector.list_folder_all("root1").await.unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].id, "a");
        assert_eq!(files[1].id, "b");
    }

    #[tokio::test]
    async fn test_requires_applied_token() {
        let connector = connector(MockHttpClient::new());

        let result = connector.list_folder("root1", None).await;
        assert!(matches!(result, Err(DriveError::NotAuthenticated)));
    }

    #[tokio::test]
    async fn test_cleared_token_blocks_requests() {
        let connector = connector(MockHttpClient::new());
        connector.apply_token("tok");
        connector.clear_token();

        let result = connector.get_file("file1").await;
        assert!(matches!(result, Err(DriveError::NotAuthenticated)));
    }

    #[tokio::test]
    async fn test_get_file_success() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|req| {
            assert!(req.url.contains("/files/file1?"));
            Ok(response(
                200,
                r#"{
                    "id": "file1",
                    "name": "Welcome",
                    "mimeType": "application/vnd.google-apps.document",
                    "starred": true
                }"#,
            ))
        });

        let connector = connector(mock_http);
        connector.apply_token("tok");

        let file = connector.get_file("file1").await.unwrap();
        assert_eq!(file.name, "Welcome");
        assert!(file.starred);
    }

    #[tokio::test]
    async fn test_get_file_not_found() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| Ok(response(404, "File not found")));

        let connector = connector(mock_http);
        connector.apply_token("tok");

        let result = connector.get_file("nonexistent").await;
        assert!(matches!(
            result,
            Err(DriveError::FileNotFound { file_id }) if file_id == "nonexistent"
        ));
    }

    #[tokio::test]
    async fn test_api_error_emits_failure_event() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| Ok(response(403, "Insufficient permissions")));

        let bus = EventBus::default();
        let mut receiver = bus.subscribe();
        let connector = DriveConnector::new(
            Arc::new(mock_http),
            "test-api-key".to_string(),
            bus.clone(),
        );
        connector.apply_token("tok");

        let result = connector.list_folder("root1", None).await;
        assert!(matches!(
            result,
            Err(DriveError::ApiError {
                status_code: 403,
                ..
            })
        ));

        let mut failures = 0;
        while let Ok(event) = receiver.try_recv() {
            if let CoreEvent::Drive(DriveEvent::RequestFailed { recoverable, .. }) = event {
                assert!(!recoverable);
                failures += 1;
            }
        }
        assert_eq!(failures, 1);
    }
}
