use std::sync::Arc;

use crate::database::Database;
use crate::service::feature_channel_service::FeatureChannelService;
use crate::service::shift_register_service::ShiftRegisterService;
use crate::service::team_register_service::TeamRegisterService;
use crate::sheets::SheetClient;

pub mod error;
pub mod feature_channel_service;
pub mod keyed_lock;
pub mod shift_register_service;
pub mod team_register_service;

pub struct Services {
    pub feature_channel: Arc<FeatureChannelService>,
    pub team_register: Arc<TeamRegisterService>,
    pub shift_register: Arc<ShiftRegisterService>,
    pub sheets: Arc<SheetClient>,
}

impl Services {
    pub fn new(db: Arc<Database>, sheets: Arc<SheetClient>) -> Self {
        let feature_channel = Arc::new(FeatureChannelService::new(db.clone()));

        Self {
            team_register: Arc::new(TeamRegisterService::new(
                db.clone(),
                sheets.clone(),
                feature_channel.clone(),
            )),
            shift_register: Arc::new(ShiftRegisterService::new(
                db,
                sheets.clone(),
                feature_channel.clone(),
            )),
            feature_channel,
            sheets,
        }
    }
}
