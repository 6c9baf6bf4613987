use clap::ValueEnum;

use crate::{Query, Res, Tidal, config, error, types::Document};

/// Catalog collections reachable through `tidlcli get`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Resource {
    Album,
    Artist,
    ArtistRole,
    Provider,
    Track,
    Video,
    User,
}

impl Resource {
    fn collection(self) -> &'static str {
        match self {
            Resource::Album => "albums",
            Resource::Artist => "artists",
            Resource::ArtistRole => "artistRoles",
            Resource::Provider => "providers",
            Resource::Track => "tracks",
            Resource::Video => "videos",
            Resource::User => "users",
        }
    }

    fn is_regional(self) -> bool {
        matches!(
            self,
            Resource::Album | Resource::Artist | Resource::Track | Resource::Video
        )
    }
}

/// Relationships of a search result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SearchScope {
    Albums,
    Artists,
    Playlists,
    TopHits,
    Tracks,
    Videos,
}

pub struct GetOptions {
    pub resource: Resource,
    pub id: String,
    pub relationship: Option<String>,
    pub include: Vec<String>,
    pub country: Option<String>,
    pub json: bool,
}

pub fn get(opts: GetOptions) {
    if let Err(e) = run_get(opts) {
        error!("Request failed: {}", e);
    }
}

fn run_get(opts: GetOptions) -> Res<()> {
    let mut tidal = super::build_client()?;
    let country = opts.country.unwrap_or_else(config::tidal_country_code);
    let query = include_query(&opts.include);

    let pb = super::spinner("Fetching from TIDAL...");
    let document = match opts.relationship.as_deref() {
        Some(name) => {
            let query = match opts.resource {
                r if r.is_regional() => query.with("countryCode", country),
                Resource::User => query.with("locale", config::tidal_locale()),
                _ => query,
            };
            tidal.relationship(opts.resource.collection(), &opts.id, name, query)
        }
        None => fetch_item(&mut tidal, opts.resource, &opts.id, &country, query),
    };
    pb.finish_and_clear();

    super::print_document(&document?, opts.json)
}

fn fetch_item(
    tidal: &mut Tidal,
    resource: Resource,
    id: &str,
    country: &str,
    query: Query,
) -> Result<Document, crate::ApiError> {
    match resource {
        Resource::Album => tidal.album(id, country, query),
        Resource::Artist => tidal.artist(id, country, query),
        Resource::ArtistRole => tidal.artist_role(id, query),
        Resource::Provider => tidal.provider(id, query),
        Resource::Track => tidal.track(id, country, query),
        Resource::Video => tidal.video(id, country, query),
        Resource::User if id == "me" => tidal.me(query),
        Resource::User => tidal.user(id, query),
    }
}

pub struct SearchOptions {
    pub term: String,
    pub scope: Option<SearchScope>,
    pub include: Vec<String>,
    pub country: Option<String>,
    pub json: bool,
}

pub fn search(opts: SearchOptions) {
    if let Err(e) = run_search(opts) {
        error!("Search failed: {}", e);
    }
}

fn run_search(opts: SearchOptions) -> Res<()> {
    let mut tidal = super::build_client()?;
    let country = opts.country.unwrap_or_else(config::tidal_country_code);
    let query = include_query(&opts.include);
    let term = opts.term.as_str();

    let pb = super::spinner("Searching...");
    let document = match opts.scope {
        None => tidal.search(term, &country, query),
        Some(SearchScope::Albums) => tidal.search_albums(term, &country, query),
        Some(SearchScope::Artists) => tidal.search_artists(term, &country, query),
        Some(SearchScope::Playlists) => tidal.search_playlists(term, &country, query),
        Some(SearchScope::TopHits) => tidal.search_top_hits(term, &country, query),
        Some(SearchScope::Tracks) => tidal.search_tracks(term, &country, query),
        Some(SearchScope::Videos) => tidal.search_videos(term, &country, query),
    };
    pb.finish_and_clear();

    super::print_document(&document?, opts.json)
}

fn include_query(include: &[String]) -> Query {
    let include: Vec<&str> = include.iter().map(String::as_str).collect();
    Query::new().include(&include)
}
