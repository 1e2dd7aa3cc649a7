//! Message geolocation from the author's profile.

use std::sync::Arc;

use pulseline_engine::plugin::{item_operator, Stage};
use pulseline_engine::stream::EntityStream;
use pulseline_types::config::StageConfig;
use pulseline_types::entity::Message;
use pulseline_types::error::{ConfigError, StageError};
use serde::Deserialize;

use crate::repository::ProfileRepository;

/// Options for `fix-geo-message/from-profile`. Unknown options are
/// rejected.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct GeoOptions {
    /// Replace coordinates a message already carries.
    overwrite: bool,
}

/// Copies the author profile's coordinates onto messages that lack
/// their own. A missing profile or a profile without coordinates is a
/// normal outcome — the message flows on without coordinates.
/// Repository failures are stage errors.
pub struct FromProfileGeoFixer {
    profiles: Arc<dyn ProfileRepository>,
}

impl FromProfileGeoFixer {
    #[must_use]
    pub fn new(profiles: Arc<dyn ProfileRepository>) -> Self {
        Self { profiles }
    }
}

impl Stage<Message> for FromProfileGeoFixer {
    fn name(&self) -> &str {
        "from-profile"
    }

    fn apply(
        &self,
        config: &StageConfig,
        input: EntityStream<Message>,
    ) -> Result<EntityStream<Message>, ConfigError> {
        let options: GeoOptions = config.parse()?;
        let profiles = self.profiles.clone();

        Ok(item_operator(
            move |mut message: Message| {
                let has_coords = message.latitude.is_some() && message.longitude.is_some();
                if has_coords && !options.overwrite {
                    return Ok(message);
                }
                let Some(username) = message.from_user.clone() else {
                    return Ok(message);
                };
                let profile = profiles.find_by_username(&username).map_err(|err| {
                    StageError::for_entity("from-profile", message.id.clone(), err.to_string())
                })?;
                if let Some(profile) = profile {
                    if let (Some(lat), Some(lon)) = (profile.latitude, profile.longitude) {
                        message.latitude = Some(lat);
                        message.longitude = Some(lon);
                    }
                }
                Ok(message)
            },
            input,
        ))
    }
}
