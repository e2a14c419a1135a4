//! Error handling for Discord bot commands.

use log::error;
use log::warn;
use poise::CreateReply;
use poise::FrameworkError;
use poise::serenity_prelude::*;

use crate::bot::Data;
use crate::bot::Error;
use crate::bot::error::BotError;
use crate::error::AppError;
use crate::service::error::ServiceError;
use crate::sheets::error::SheetsError;
use crate::sheets::error::SheetsErrorKind;

/// Handles framework errors and sends appropriate responses to users.
pub struct ErrorHandler;

impl ErrorHandler {
    /// Handles a framework error by classifying and responding appropriately.
    pub async fn handle(error: FrameworkError<'_, Data, Error>) {
        match error {
            FrameworkError::Command { error, ctx, .. } => {
                let (title, description) = Self::classify_error(&error, &ctx);
                let message = format!(
                    "## {}\n\n**Command:** `{}`\n**Error:** {}",
                    title,
                    ctx.command().qualified_name,
                    description
                );
                Self::send_component(&ctx, &message).await;
            }
            FrameworkError::CommandCheckFailed {
                error: Some(error),
                ctx,
                ..
            } => {
                let (title, description) = Self::classify_error(&error, &ctx);
                let message = format!("## {}\n\n{}", title, description);
                Self::send_component(&ctx, &message).await;
            }
            FrameworkError::ArgumentParse { error, ctx, .. } => {
                let message = format!(
                    "## ⚠️ Invalid Arguments\n\n**Command:** `/{}`\n**Issue:** {}\n\n> Use `/{} help` for usage information.",
                    ctx.command().name,
                    error,
                    ctx.command().name
                );
                Self::send_component(&ctx, &message).await;
            }
            error => {
                if let Err(e) = poise::builtins::on_error(error).await {
                    error!("Error while handling error: {}", e);
                }
            }
        }
    }

    /// Classifies an error and returns user-friendly title and description.
    fn classify_error(
        error: &Error,
        ctx: &poise::Context<'_, Data, Error>,
    ) -> (&'static str, String) {
        if let Some(bot_error) = error.downcast_ref::<BotError>() {
            ("❌ Action Failed", bot_error.to_string())
        } else if let Some(service_error) = error.downcast_ref::<ServiceError>() {
            let email = ctx.data().service.sheets.service_account_email();
            Self::describe_service_error(service_error, email.as_deref())
        } else if let Some(sheets_error) = error.downcast_ref::<SheetsError>() {
            let email = ctx.data().service.sheets.service_account_email();
            ("❌ Spreadsheet Error", sheets_guidance(sheets_error, email.as_deref()))
        } else {
            let ref_id = AppError::log_with_ref(&**error);
            error!(
                "Unexpected error in command `{}`: {:?}",
                ctx.command().name,
                error
            );
            (
                "❌ Internal Error",
                format!(
                    "An unexpected error occurred. Please contact the bot developer.\n-# Reference ID: {}",
                    ref_id
                ),
            )
        }
    }

    fn describe_service_error(
        error: &ServiceError,
        service_account_email: Option<&str>,
    ) -> (&'static str, String) {
        match error {
            ServiceError::FeatureNotEnabled { .. }
            | ServiceError::NotConfigured { .. }
            | ServiceError::InvalidInput { .. } => ("❌ Action Failed", error.to_string()),
            ServiceError::SheetsError(sheets_error) => {
                warn!("Spreadsheet request failed: {sheets_error}");
                (
                    "❌ Spreadsheet Error",
                    sheets_guidance(sheets_error, service_account_email),
                )
            }
            _ => {
                let ref_id = AppError::log_with_ref(error);
                (
                    "❌ Service Error",
                    format!(
                        "The request could not be completed. Please try again later.\n-# Reference ID: {}",
                        ref_id
                    ),
                )
            }
        }
    }

    /// Sends an error message as an ephemeral Components V2 container.
    async fn send_component(ctx: &poise::Context<'_, Data, Error>, message: &str) {
        let components = vec![CreateComponent::Container(CreateContainer::new(vec![
            CreateContainerComponent::TextDisplay(CreateTextDisplay::new(message)),
        ]))];

        let _ = ctx
            .send(
                CreateReply::default()
                    .flags(MessageFlags::IS_COMPONENTS_V2)
                    .ephemeral(true)
                    .components(components),
            )
            .await;
    }
}

/// What an administrator can do about a failed spreadsheet request.
pub fn sheets_guidance(error: &SheetsError, service_account_email: Option<&str>) -> String {
    let share_with = service_account_email
        .map(|email| format!("`{email}`"))
        .unwrap_or_else(|| "the bot's service account".to_string());

    match error.kind() {
        SheetsErrorKind::NotFound => format!(
            "The spreadsheet or worksheet was not found. Check the link, or create the sheet and share it with {share_with}."
        ),
        SheetsErrorKind::Auth => format!(
            "The bot cannot access the spreadsheet. Share it with {share_with} as an editor, or check the service account credentials."
        ),
        SheetsErrorKind::Transient => {
            "Google Sheets is unavailable right now. Please try again later.".to_string()
        }
        SheetsErrorKind::Api => format!("Google Sheets rejected the request: {error}"),
    }
}

/// Text shown inside a settings panel when a submitted form fails. `None`
/// means the error is not the submitter's to fix.
pub fn form_error_text(error: &ServiceError, service_account_email: Option<&str>) -> Option<String> {
    match error {
        ServiceError::InvalidInput { .. } | ServiceError::FeatureNotEnabled { .. } => {
            Some(error.to_string())
        }
        ServiceError::SheetsError(sheets_error) => {
            Some(sheets_guidance(sheets_error, service_account_email))
        }
        _ => None,
    }
}
