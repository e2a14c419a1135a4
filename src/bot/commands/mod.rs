use crate::bot::Data;

pub mod feature_channel;
pub mod features;
pub mod shift_register;
pub mod team_register;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

pub use features::FeaturesCog;
use poise::Command;
pub use shift_register::ShiftRegisterCog;
pub use team_register::TeamRegisterCog;

pub trait Cog {
    fn commands(&self) -> Vec<Command<Data, Error>>;
}

pub struct Cogs;

impl Cog for Cogs {
    fn commands(&self) -> Vec<Command<Data, Error>> {
        let features_cog = FeaturesCog;
        let team_register_cog = TeamRegisterCog;
        let shift_register_cog = ShiftRegisterCog;

        features_cog
            .commands()
            .into_iter()
            .chain(team_register_cog.commands())
            .chain(shift_register_cog.commands())
            .collect()
    }
}
