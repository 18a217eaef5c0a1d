use serde_json::json;

use crate::error::AppError;
use crate::routing::{Construct, Controller, Operation, Outcome, RequestContext};

/// Public pages. The default handler.
pub struct Pages;

impl Pages {
    fn index(&mut self, _ctx: &mut RequestContext<'_>, _params: &[String]) -> Result<Outcome, AppError> {
        Ok(Outcome::render(
            "pages/index",
            json!({
                "title": "DogeMVC",
                "description": "Socialize with Doges.",
            }),
        ))
    }

    fn about(&mut self, _ctx: &mut RequestContext<'_>, _params: &[String]) -> Result<Outcome, AppError> {
        Ok(Outcome::render(
            "pages/about",
            json!({
                "title": "About Us",
                "description": "An app for sharing posts with other doges",
                "version": env!("CARGO_PKG_VERSION"),
            }),
        ))
    }
}

impl Controller for Pages {
    const NAME: &'static str = "Pages";
    const OPERATIONS: &'static [(&'static str, Operation<Self>)] =
        &[("index", Pages::index), ("about", Pages::about)];

    fn construct(_ctx: &mut RequestContext<'_>) -> Result<Construct<Self>, AppError> {
        Ok(Construct::Ready(Pages))
    }
}
