use std::{collections::BTreeMap, fmt};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tabled::Tabled;

use crate::{
    error::ApiError,
    utils::{self, DEFAULT_STATE_LENGTH, DEFAULT_VERIFIER_LENGTH, HashAlgorithm},
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientCredentials {
    pub client_id: String,
    /// Empty for public clients that only use PKCE.
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub redirect_uri: String,
}

impl ClientCredentials {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            ..Default::default()
        }
    }

    pub fn with_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = client_secret.into();
        self
    }

    pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = redirect_uri.into();
        self
    }

    pub fn has_secret(&self) -> bool {
        !self.client_secret.is_empty()
    }
}

/// Tokens granted to a session.
///
/// `expires_at` is computed when the grant succeeds and is never checked
/// automatically; see [`TokenState::is_expired`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenState {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scope: Vec<String>,
}

impl TokenState {
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires) => Utc::now() >= expires,
            None => false,
        }
    }

    pub fn scope_string(&self) -> String {
        self.scope.join(" ")
    }
}

/// PKCE values for one authorization attempt.
///
/// The caller keeps `code_verifier` and `state` across the redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkceMaterial {
    pub code_verifier: String,
    pub code_challenge: String,
    pub state: String,
}

impl PkceMaterial {
    pub fn generate() -> Result<Self, ApiError> {
        let code_verifier = utils::generate_code_verifier(DEFAULT_VERIFIER_LENGTH)?;
        let code_challenge = utils::generate_code_challenge(&code_verifier, HashAlgorithm::Sha256);
        let state = utils::generate_state(DEFAULT_STATE_LENGTH)?;
        Ok(Self {
            code_verifier,
            code_challenge,
            state,
        })
    }
}

/// Options for the authorization redirect URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizeOptions {
    pub code_challenge: String,
    pub code_challenge_method: String,
    pub scope: Vec<String>,
    pub state: Option<String>,
}

impl AuthorizeOptions {
    pub fn new(code_challenge: impl Into<String>) -> Self {
        Self {
            code_challenge: code_challenge.into(),
            code_challenge_method: "S256".to_string(),
            scope: Vec::new(),
            state: None,
        }
    }

    pub fn with_scope<S: Into<String>>(mut self, scope: impl IntoIterator<Item = S>) -> Self {
        self.scope = scope.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_challenge_method(mut self, method: impl Into<String>) -> Self {
        self.code_challenge_method = method.into();
        self
    }
}

impl From<&PkceMaterial> for AuthorizeOptions {
    fn from(pkce: &PkceMaterial) -> Self {
        AuthorizeOptions::new(pkce.code_challenge.clone()).with_state(pkce.state.clone())
    }
}

/// JSON:API `type` of a catalog resource.
///
/// Types this crate has no variant for are kept verbatim in `Other`, so a
/// decoded document serializes back to the same `type` strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResourceType {
    Albums,
    Artists,
    ArtistRoles,
    Artworks,
    Providers,
    Tracks,
    Videos,
    Playlists,
    SearchResults,
    Users,
    UserEntitlements,
    UserPublicProfiles,
    UserRecommendations,
    Other(String),
}

impl ResourceType {
    pub fn as_str(&self) -> &str {
        match self {
            ResourceType::Albums => "albums",
            ResourceType::Artists => "artists",
            ResourceType::ArtistRoles => "artistRoles",
            ResourceType::Artworks => "artworks",
            ResourceType::Providers => "providers",
            ResourceType::Tracks => "tracks",
            ResourceType::Videos => "videos",
            ResourceType::Playlists => "playlists",
            ResourceType::SearchResults => "searchResults",
            ResourceType::Users => "users",
            ResourceType::UserEntitlements => "userEntitlements",
            ResourceType::UserPublicProfiles => "userPublicProfiles",
            ResourceType::UserRecommendations => "userRecommendations",
            ResourceType::Other(kind) => kind,
        }
    }
}

impl From<String> for ResourceType {
    fn from(kind: String) -> Self {
        match kind.as_str() {
            "albums" => ResourceType::Albums,
            "artists" => ResourceType::Artists,
            "artistRoles" => ResourceType::ArtistRoles,
            "artworks" => ResourceType::Artworks,
            "providers" => ResourceType::Providers,
            "tracks" => ResourceType::Tracks,
            "videos" => ResourceType::Videos,
            "playlists" => ResourceType::Playlists,
            "searchResults" => ResourceType::SearchResults,
            "users" => ResourceType::Users,
            "userEntitlements" => ResourceType::UserEntitlements,
            "userPublicProfiles" => ResourceType::UserPublicProfiles,
            "userRecommendations" => ResourceType::UserRecommendations,
            _ => ResourceType::Other(kind),
        }
    }
}

impl From<&str> for ResourceType {
    fn from(kind: &str) -> Self {
        ResourceType::from(kind.to_string())
    }
}

impl From<ResourceType> for String {
    fn from(kind: ResourceType) -> Self {
        match kind {
            ResourceType::Other(kind) => kind,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JSON:API top level document returned by the catalog endpoints.
///
/// Documents decoded by [`crate::Tidal`] also keep the body they were decoded
/// from, see [`Document::source`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub data: PrimaryData,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub included: Vec<Resource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
    #[serde(skip)]
    source: Value,
}

impl Document {
    /// Decodes a response body. `null` yields an empty document.
    pub fn from_value(value: Value) -> Result<Self, ApiError> {
        if value.is_null() {
            return Ok(Document::default());
        }
        let mut document = Document::deserialize(&value)?;
        document.source = value;
        Ok(document)
    }

    /// The JSON body exactly as received, or `Null` when the document was not
    /// built with [`Document::from_value`].
    pub fn source(&self) -> &Value {
        &self.source
    }

    /// All primary resources, whether the document holds one or many.
    pub fn resources(&self) -> Vec<&Resource> {
        match &self.data {
            PrimaryData::Many(resources) => resources.iter().collect(),
            PrimaryData::One(resource) => vec![resource.as_ref()],
            _ => Vec::new(),
        }
    }

    /// Identifiers of the primary data, for relationship documents.
    pub fn identifiers(&self) -> Vec<&ResourceIdentifier> {
        match &self.data {
            PrimaryData::Identifiers(ids) => ids.iter().collect(),
            PrimaryData::Identifier(id) => vec![id],
            _ => Vec::new(),
        }
    }

    /// Looks up a resource in `included`.
    pub fn find_included(&self, kind: &ResourceType, id: &str) -> Option<&Resource> {
        self.included
            .iter()
            .find(|r| &r.kind == kind && r.id == id)
    }

    pub fn next_page(&self) -> Option<&str> {
        self.links.as_ref()?.next.as_deref()
    }
}

/// Primary `data` of a document.
///
/// Entries carrying `attributes` or `relationships` are resources, bare
/// `{id, type}` entries are identifiers. Anything else lands in `Other`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(untagged)]
pub enum PrimaryData {
    Many(Vec<Resource>),
    One(Box<Resource>),
    Identifiers(Vec<ResourceIdentifier>),
    Identifier(ResourceIdentifier),
    #[default]
    None,
    Other(Value),
}

impl<'de> Deserialize<'de> for PrimaryData {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(PrimaryData::from_value(value))
    }
}

impl PrimaryData {
    fn from_value(value: Value) -> Self {
        fn is_resource(entry: &Value) -> bool {
            entry.get("attributes").is_some() || entry.get("relationships").is_some()
        }

        let decoded = if value.is_null() {
            return PrimaryData::None;
        } else if let Some(entries) = value.as_array() {
            if entries.iter().any(is_resource) {
                Vec::<Resource>::deserialize(&value).map(PrimaryData::Many)
            } else {
                Vec::<ResourceIdentifier>::deserialize(&value).map(PrimaryData::Identifiers)
            }
        } else if !value.is_object() {
            return PrimaryData::Other(value);
        } else if is_resource(&value) {
            Resource::deserialize(&value).map(|resource| PrimaryData::One(Box::new(resource)))
        } else {
            ResourceIdentifier::deserialize(&value).map(PrimaryData::Identifier)
        };
        decoded.unwrap_or(PrimaryData::Other(value))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ResourceType,
    #[serde(default)]
    pub attributes: Value,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub relationships: BTreeMap<String, Relationship>,
}

impl Resource {
    pub fn attribute_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    /// Display name: `title` for releases and tracks, `name` otherwise.
    pub fn display_name(&self) -> &str {
        self.attribute_str("title")
            .or_else(|| self.attribute_str("name"))
            .or_else(|| self.attribute_str("username"))
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<RelationshipData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RelationshipData {
    Many(Vec<ResourceIdentifier>),
    One(ResourceIdentifier),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceIdentifier {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ResourceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

/// Pagination links. Cursor details live in `meta` (`nextCursor`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Links {
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

#[derive(Tabled)]
pub struct ResourceTableRow {
    pub kind: String,
    pub id: String,
    pub name: String,
}

impl From<&Resource> for ResourceTableRow {
    fn from(resource: &Resource) -> Self {
        ResourceTableRow {
            kind: resource.kind.to_string(),
            id: resource.id.clone(),
            name: resource.display_name().to_string(),
        }
    }
}

impl From<&ResourceIdentifier> for ResourceTableRow {
    fn from(identifier: &ResourceIdentifier) -> Self {
        ResourceTableRow {
            kind: identifier.kind.to_string(),
            id: identifier.id.clone(),
            name: String::new(),
        }
    }
}

/// Authorization attempt shared between `tidlcli auth` and the callback
/// handler.
#[derive(Debug, Clone, Default)]
pub struct PendingAuthorization {
    pub state: String,
    pub code: Option<String>,
    pub error: Option<String>,
}

impl PendingAuthorization {
    pub fn new(state: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            ..Default::default()
        }
    }

    pub fn is_settled(&self) -> bool {
        self.code.is_some() || self.error.is_some()
    }
}
