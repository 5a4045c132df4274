//! TFVC REST client
//!
//! Implements the version control capabilities against the REST API of
//! TFS 2017+ and Azure DevOps using blocking HTTP. Every call blocks the
//! calling thread until the server answers.

mod wire;

use std::io::Read;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, trace};

use crate::config::ServerConfig;
use crate::domain::{Change, Changeset, Credential, Item, VersionSpec};
use crate::infrastructure::traits::{
    Connector, HistoryQuery, NonFatalError, Notifier, VersionControl,
};
use crate::infrastructure::{RemoteError, RemoteResult};

use wire::{
    ConnectionData, ErrorBody, ListEnvelope, TfvcChange, TfvcChangeset, TfvcItem,
};

/// Longest comment the server is asked to return.
const MAX_COMMENT_LENGTH: &str = "65536";

/// Opens `TfvcRestClient` connections.
#[derive(Debug, Clone)]
pub struct RestConnector {
    config: ServerConfig,
}

impl RestConnector {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }
}

impl Connector for RestConnector {
    fn connect(
        &self,
        url: &str,
        credential: Option<&Credential>,
        notifier: Notifier,
    ) -> RemoteResult<Box<dyn VersionControl>> {
        let base = Url::parse(url.trim_end_matches('/'))
            .map_err(|e| RemoteError::Transport(format!("invalid server url {}: {}", url, e)))?;
        let http = Client::builder()
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .user_agent(concat!("tfsget/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        debug!("connect: base={}", base);
        Ok(Box::new(TfvcRestClient {
            http,
            base_url: base.as_str().trim_end_matches('/').to_string(),
            credential: credential.cloned(),
            api_version: self.config.api_version.clone(),
            page_size: self.config.page_size.max(1),
            notifier,
        }))
    }
}

/// Connection to one project collection.
pub struct TfvcRestClient {
    http: Client,
    base_url: String,
    credential: Option<Credential>,
    api_version: String,
    page_size: u32,
    notifier: Notifier,
}

impl Drop for TfvcRestClient {
    fn drop(&mut self) {
        debug!("connection to {} closed", self.base_url);
    }
}

/// Query parameters selecting an item version.
fn version_params(version: &VersionSpec) -> Vec<(&'static str, String)> {
    match version {
        VersionSpec::Latest => Vec::new(),
        VersionSpec::Changeset(id) => vec![
            ("versionDescriptor.versionType", "changeset".to_string()),
            ("versionDescriptor.version", id.to_string()),
        ],
        VersionSpec::Date(date) => vec![
            ("versionDescriptor.versionType", "date".to_string()),
            ("versionDescriptor.version", date.format("%m/%d/%Y").to_string()),
        ],
    }
}

impl TfvcRestClient {
    fn url(&self, resource: &str) -> String {
        format!("{}/{}", self.base_url, resource)
    }

    fn get(&self, resource: &str) -> RequestBuilder {
        let request = self.http.get(self.url(resource));
        match &self.credential {
            Some(cred) => request.basic_auth(&cred.user, cred.password.as_deref()),
            None => request,
        }
    }

    fn send(&self, request: RequestBuilder) -> RemoteResult<Response> {
        let response = request
            .send()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        let status = response.status();
        trace!("{} {}", status, response.url());

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(RemoteError::Unauthorized(format!(
                "TF30063: You are not authorized to access {}.",
                self.base_url
            )));
        }
        // Azure DevOps answers anonymous requests with a sign-in page
        if status == StatusCode::NON_AUTHORITATIVE_INFORMATION {
            return Err(RemoteError::Unauthorized(format!(
                "{} redirected to an interactive sign-in page",
                self.base_url
            )));
        }
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|e| e.message)
            .unwrap_or(body);
        if status == StatusCode::NOT_FOUND {
            Err(RemoteError::NotFound(message))
        } else {
            Err(RemoteError::Http {
                status: status.as_u16(),
                message,
            })
        }
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        resource: &str,
        params: &[(&str, String)],
    ) -> RemoteResult<T> {
        let response = self.send(self.get(resource).query(params))?;
        response
            .json::<T>()
            .map_err(|e| RemoteError::Decode(format!("{}: {}", resource, e)))
    }

    /// Fetch all pages of a `$top`/`$skip` paged list.
    fn get_paged<T: DeserializeOwned>(
        &self,
        resource: &str,
        params: &[(&str, String)],
        limit: Option<usize>,
    ) -> RemoteResult<Vec<T>> {
        let mut all = Vec::new();
        let page_size = self.page_size as usize;
        loop {
            let mut page_params = params.to_vec();
            page_params.push(("$top", page_size.to_string()));
            page_params.push(("$skip", all.len().to_string()));
            let page: ListEnvelope<T> = self.get_json(resource, &page_params)?;
            let fetched = page.value.len();
            all.extend(page.value);
            if fetched < page_size || limit.is_some_and(|l| all.len() >= l) {
                break;
            }
        }
        if let Some(limit) = limit {
            all.truncate(limit);
        }
        Ok(all)
    }

    fn notify(&self, message: String) {
        // receiver gone means nobody is listening anymore
        let _ = self.notifier.send(NonFatalError::new(message));
    }

    fn changeset_details(&self, id: u32) -> RemoteResult<Changeset> {
        let dto: TfvcChangeset = self.get_json(
            &format!("_apis/tfvc/changesets/{}", id),
            &[
                ("includeDetails", "true".to_string()),
                ("includeWorkItems", "true".to_string()),
                ("maxCommentLength", MAX_COMMENT_LENGTH.to_string()),
                ("api-version", self.api_version.clone()),
            ],
        )?;
        Ok(dto.into())
    }
}

impl VersionControl for TfvcRestClient {
    #[instrument(skip(self), fields(url = %self.base_url))]
    fn authenticate(&self) -> RemoteResult<String> {
        let data: ConnectionData = self.get_json("_apis/connectionData", &[])?;
        let user = data
            .authenticated_user
            .and_then(|u| u.custom_display_name.or(u.provider_display_name))
            .unwrap_or_else(|| "anonymous".to_string());
        debug!("authenticated as {}", user);
        Ok(user)
    }

    #[instrument(skip(self))]
    fn list_items(&self, path: &str, version: &VersionSpec) -> RemoteResult<Vec<Item>> {
        let mut params = vec![
            ("scopePath", path.to_string()),
            ("recursionLevel", "Full".to_string()),
            ("api-version", self.api_version.clone()),
        ];
        params.extend(version_params(version));
        let items: ListEnvelope<TfvcItem> = self.get_json("_apis/tfvc/items", &params)?;
        debug!("list_items: {} items", items.value.len());
        Ok(items.value.into_iter().map(Item::from).collect())
    }

    fn download(&self, item: &Item) -> RemoteResult<Box<dyn Read + Send>> {
        let mut params = vec![
            ("path", item.server_path.clone()),
            ("download", "true".to_string()),
            ("api-version", self.api_version.clone()),
        ];
        if item.changeset_id > 0 {
            params.extend(version_params(&VersionSpec::Changeset(item.changeset_id)));
        }
        let request = self
            .get("_apis/tfvc/items")
            .query(&params)
            .header(reqwest::header::ACCEPT, "application/octet-stream");
        let response = self.send(request)?;
        Ok(Box::new(response))
    }

    #[instrument(skip(self))]
    fn query_history(&self, query: &HistoryQuery) -> RemoteResult<Vec<Changeset>> {
        if !query.recursive {
            return Err(RemoteError::Unsupported(
                "non-recursive history queries".to_string(),
            ));
        }
        let mut params = vec![
            ("searchCriteria.itemPath", query.path.clone()),
            ("maxCommentLength", MAX_COMMENT_LENGTH.to_string()),
            ("api-version", self.api_version.clone()),
        ];
        let mut limit = None;
        match &query.range.start {
            None => {}
            Some(VersionSpec::Latest) => limit = Some(1),
            Some(VersionSpec::Changeset(id)) => {
                params.push(("searchCriteria.fromId", id.to_string()))
            }
            Some(VersionSpec::Date(date)) => {
                params.push(("searchCriteria.fromDate", date.format("%Y-%m-%d").to_string()))
            }
        }
        match &query.range.end {
            None | Some(VersionSpec::Latest) => {}
            Some(VersionSpec::Changeset(id)) => params.push(("searchCriteria.toId", id.to_string())),
            Some(VersionSpec::Date(date)) => {
                params.push(("searchCriteria.toDate", date.format("%Y-%m-%d").to_string()))
            }
        }

        let summaries: Vec<TfvcChangeset> =
            self.get_paged("_apis/tfvc/changesets", &params, limit)?;
        debug!("query_history: {} changesets", summaries.len());

        let mut history = Vec::with_capacity(summaries.len());
        for summary in summaries {
            let summary: Changeset = summary.into();
            if !query.include_details {
                history.push(summary);
                continue;
            }
            match self.changeset_details(summary.id) {
                Ok(detailed) => history.push(detailed),
                Err(e) => {
                    self.notify(format!("changeset {} details unavailable: {}", summary.id, e));
                    history.push(summary);
                }
            }
        }
        Ok(history)
    }

    #[instrument(skip(self))]
    fn changes_for_changeset(&self, changeset_id: u32) -> RemoteResult<Vec<Change>> {
        let changes: Vec<TfvcChange> = self.get_paged(
            &format!("_apis/tfvc/changesets/{}/changes", changeset_id),
            &[("api-version", self.api_version.clone())],
            None,
        )?;
        Ok(changes
            .into_iter()
            .map(|change| {
                let (change_type, unknown) = change.change_type.decode();
                if !unknown.is_empty() {
                    self.notify(format!(
                        "changeset {}: unknown change type '{}' on {}",
                        changeset_id,
                        unknown.join(", "),
                        change.item.path
                    ));
                }
                Change {
                    change_type,
                    server_path: change.item.path,
                }
            })
            .collect())
    }
}
