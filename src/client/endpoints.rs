use crate::{
    client::Tidal,
    error::ApiError,
    transport::Params,
    types::Document,
    utils::encode_path_segment,
};

const COUNTRY_CODE: &str = "countryCode";
const LOCALE: &str = "locale";
const FILTER_ID: &str = "filter[id]";
const INCLUDE: &str = "include";

/// Query options for catalog requests.
///
/// Setting a key that is already present replaces its value, so required
/// arguments merged in by the endpoint methods win over caller options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query(Vec<(String, String)>);

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
    }

    /// Related resources to embed in `included`.
    pub fn include(self, relationships: &[&str]) -> Self {
        if relationships.is_empty() {
            return self;
        }
        self.with(INCLUDE, relationships.join(","))
    }

    /// Restricts a collection request to the given ids.
    pub fn ids(self, ids: &[&str]) -> Self {
        if ids.is_empty() {
            return self;
        }
        self.with(FILTER_ID, ids.join(","))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Query> for Params {
    fn from(query: Query) -> Self {
        if query.is_empty() {
            Params::None
        } else {
            Params::Form(query.0)
        }
    }
}

impl Tidal {
    /// Fetches the `name` relationship of `collection/id`.
    pub fn relationship(
        &mut self,
        collection: &str,
        id: &str,
        name: &str,
        options: Query,
    ) -> Result<Document, ApiError> {
        let path = format!(
            "/{collection}/{id}/relationships/{name}",
            id = encode_path_segment(id)
        );
        self.get(&path, options)
    }

    fn item(&mut self, collection: &str, id: &str, options: Query) -> Result<Document, ApiError> {
        let path = format!("/{collection}/{id}", id = encode_path_segment(id));
        self.get(&path, options)
    }

    fn list(&mut self, collection: &str, ids: &[&str], options: Query) -> Result<Document, ApiError> {
        self.get(&format!("/{collection}"), options.ids(ids))
    }

    /// The user the current token belongs to.
    pub fn me(&mut self, options: Query) -> Result<Document, ApiError> {
        self.get("/users/me", options)
    }

    pub fn user_public_profile(
        &mut self,
        id: &str,
        locale: &str,
        options: Query,
    ) -> Result<Document, ApiError> {
        self.relationship("users", id, "publicProfile", options.with(LOCALE, locale))
    }

    pub fn my_entitlements(&mut self, options: Query) -> Result<Document, ApiError> {
        self.get("/userEntitlements/me", options)
    }

    pub fn my_recommendations(
        &mut self,
        country_code: &str,
        locale: &str,
        options: Query,
    ) -> Result<Document, ApiError> {
        self.get(
            "/userRecommendations/me",
            options.with(COUNTRY_CODE, country_code).with(LOCALE, locale),
        )
    }

    pub fn user_recommendation(
        &mut self,
        id: &str,
        country_code: &str,
        locale: &str,
        options: Query,
    ) -> Result<Document, ApiError> {
        self.item(
            "userRecommendations",
            id,
            options.with(COUNTRY_CODE, country_code).with(LOCALE, locale),
        )
    }

    /// Recommendations of several users at once.
    pub fn user_recommendations(
        &mut self,
        ids: &[&str],
        country_code: &str,
        locale: &str,
        options: Query,
    ) -> Result<Document, ApiError> {
        self.list(
            "userRecommendations",
            ids,
            options.with(COUNTRY_CODE, country_code).with(LOCALE, locale),
        )
    }

    pub fn my_playlists(&mut self, country_code: &str, options: Query) -> Result<Document, ApiError> {
        self.get("/playlists/me", options.with(COUNTRY_CODE, country_code))
    }
}

// Each row expands to one method on `Tidal`:
//
// item           fn(id, country_code, options)          GET /collection/id
// item_global    fn(id, options)                        GET /collection/id
// list           fn(ids, country_code, options)         GET /collection?filter[id]=..
// list_global    fn(ids, options)                       GET /collection?filter[id]=..
// related        fn(id, country_code, options)          GET /collection/id/relationships/name
// related_global fn(id, options)                        GET /collection/id/relationships/name
// related_locale fn(id, country_code, locale, options)  GET /collection/id/relationships/name
macro_rules! catalog_endpoints {
    ($($(#[$meta:meta])* $name:ident => $kind:ident $collection:literal $(/ $relationship:literal)?;)*) => {
        impl Tidal {
            $(catalog_endpoints!(@$kind $(#[$meta])* $name, $collection $(, $relationship)?);)*
        }
    };
    (@item $(#[$meta:meta])* $name:ident, $collection:literal) => {
        $(#[$meta])*
        pub fn $name(&mut self, id: &str, country_code: &str, options: Query) -> Result<Document, ApiError> {
            self.item($collection, id, options.with(COUNTRY_CODE, country_code))
        }
    };
    (@item_global $(#[$meta:meta])* $name:ident, $collection:literal) => {
        $(#[$meta])*
        pub fn $name(&mut self, id: &str, options: Query) -> Result<Document, ApiError> {
            self.item($collection, id, options)
        }
    };
    (@list $(#[$meta:meta])* $name:ident, $collection:literal) => {
        $(#[$meta])*
        pub fn $name(&mut self, ids: &[&str], country_code: &str, options: Query) -> Result<Document, ApiError> {
            self.list($collection, ids, options.with(COUNTRY_CODE, country_code))
        }
    };
    (@list_global $(#[$meta:meta])* $name:ident, $collection:literal) => {
        $(#[$meta])*
        pub fn $name(&mut self, ids: &[&str], options: Query) -> Result<Document, ApiError> {
            self.list($collection, ids, options)
        }
    };
    (@related $(#[$meta:meta])* $name:ident, $collection:literal, $relationship:literal) => {
        $(#[$meta])*
        pub fn $name(&mut self, id: &str, country_code: &str, options: Query) -> Result<Document, ApiError> {
            self.relationship($collection, id, $relationship, options.with(COUNTRY_CODE, country_code))
        }
    };
    (@related_global $(#[$meta:meta])* $name:ident, $collection:literal, $relationship:literal) => {
        $(#[$meta])*
        pub fn $name(&mut self, id: &str, options: Query) -> Result<Document, ApiError> {
            self.relationship($collection, id, $relationship, options)
        }
    };
    (@related_locale $(#[$meta:meta])* $name:ident, $collection:literal, $relationship:literal) => {
        $(#[$meta])*
        pub fn $name(
            &mut self,
            id: &str,
            country_code: &str,
            locale: &str,
            options: Query,
        ) -> Result<Document, ApiError> {
            self.relationship(
                $collection,
                id,
                $relationship,
                options.with(COUNTRY_CODE, country_code).with(LOCALE, locale),
            )
        }
    };
}

catalog_endpoints! {
    album => item "albums";
    albums => list "albums";
    album_artists => related "albums" / "artists";
    /// Tracks and videos of an album, in volume and track order.
    album_items => related "albums" / "items";
    album_providers => related "albums" / "providers";
    similar_albums => related "albums" / "similarAlbums";

    artist => item "artists";
    artists => list "artists";
    artist_albums => related "artists" / "albums";
    artist_radio => related "artists" / "radio";
    artist_roles_relationship => related "artists" / "roles";
    similar_artists => related "artists" / "similarArtists";
    artist_track_providers => related "artists" / "trackProviders";
    artist_tracks => related "artists" / "tracks";
    artist_videos => related "artists" / "videos";

    artist_role => item_global "artistRoles";
    artist_roles => list_global "artistRoles";

    provider => item_global "providers";
    providers => list_global "providers";

    track => item "tracks";
    tracks => list "tracks";
    track_albums => related "tracks" / "albums";
    track_artists => related "tracks" / "artists";
    track_providers => related "tracks" / "providers";
    track_radio => related "tracks" / "radio";
    similar_tracks => related "tracks" / "similarTracks";

    video => item "videos";
    videos => list "videos";
    video_albums => related "videos" / "albums";
    video_artists => related "videos" / "artists";
    video_providers => related "videos" / "providers";

    /// Search results for `id`, which is the search query.
    search => item "searchresults";
    search_albums => related "searchresults" / "albums";
    search_artists => related "searchresults" / "artists";
    search_playlists => related "searchresults" / "playlists";
    search_top_hits => related "searchresults" / "topHits";
    search_tracks => related "searchresults" / "tracks";
    search_videos => related "searchresults" / "videos";

    user => item_global "users";
    users => list_global "users";
    user_entitlements_relationship => related_global "users" / "entitlements";
    user_recommendations_relationship => related_global "users" / "recommendations";

    user_entitlements => item_global "userEntitlements";

    discovery_mixes => related_locale "userRecommendations" / "discoveryMixes";
    my_mixes => related_locale "userRecommendations" / "myMixes";
    new_arrival_mixes => related_locale "userRecommendations" / "newArrivalMixes";
}
