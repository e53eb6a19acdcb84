use std::sync::Arc;

use ecosell_core::{
    model::{Center, ClassificationResult, Coordinates, NearbyCenters},
    pricing::estimate_price,
    service::EcoSellService,
    upload::UploadSurface,
};

/// Step for the weight adjustment keys.
pub(crate) const WEIGHT_STEP_KG: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Screen {
    Upload,
    Centers,
    Prices,
}

impl Screen {
    pub(crate) fn next(self) -> Self {
        match self {
            Screen::Upload => Screen::Centers,
            Screen::Centers => Screen::Prices,
            Screen::Prices => Screen::Upload,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Notice {
    Info(String),
    Error(String),
}

pub(crate) struct App {
    pub service: Arc<EcoSellService>,

    pub screen: Screen,
    pub path_input: String,
    pub upload: UploadSurface,
    pub weight_kg: f64,

    pub coords: Option<Coordinates>,
    pub nearby: Option<NearbyCenters>,
    pub center_list_index: usize,

    pub is_loading: bool,
    pub notice: Option<Notice>,
}

impl App {
    pub(crate) fn new(service: Arc<EcoSellService>) -> Self {
        Self {
            service,
            screen: Screen::Upload,
            path_input: String::new(),
            upload: UploadSurface::new(),
            weight_kg: 1.0,
            coords: None,
            nearby: None,
            center_list_index: 0,
            is_loading: false,
            notice: None,
        }
    }

    pub(crate) fn result(&self) -> Option<&ClassificationResult> {
        self.upload.result()
    }

    pub(crate) fn estimate(&self) -> Option<f64> {
        self.result()
            .map(|result| estimate_price(result.category, self.weight_kg))
    }

    pub(crate) fn centers(&self) -> &[Center] {
        self.nearby
            .as_ref()
            .map(|nearby| nearby.centers.as_slice())
            .unwrap_or_default()
    }

    pub(crate) fn selected_center(&self) -> Option<&Center> {
        self.centers().get(self.center_list_index)
    }

    /// Locate the user once, then query centers around them.
    ///
    /// A failed lookup leaves the list untouched and skips the query; a failed
    /// query clears the list. Both set an error notice; an info notice from an
    /// earlier step is kept on success.
    pub(crate) async fn refresh_centers(&mut self) {
        if matches!(self.notice, Some(Notice::Error(_))) {
            self.notice = None;
        }

        let origin = match self.coords {
            Some(origin) => origin,
            None => match self.service.locate().await {
                Ok(origin) => {
                    self.coords = Some(origin);
                    origin
                }
                Err(err) => {
                    tracing::warn!(error = %err, "location unavailable");
                    self.notice = Some(Notice::Error(format!(
                        "Could not determine your location: {err}"
                    )));
                    return;
                }
            },
        };

        let res = self.service.nearby_centers(origin).await;

        self.center_list_index = 0;
        match res {
            Ok(nearby) => {
                self.nearby = Some(nearby);
            }
            Err(err) => {
                tracing::error!(error = %err, "center lookup failed");
                self.nearby = None;
                self.notice = Some(Notice::Error(String::from(
                    "Failed to load centers. Try again later.",
                )));
            }
        }
    }

    pub(crate) fn heavier(&mut self) {
        self.weight_kg += WEIGHT_STEP_KG;
    }

    pub(crate) fn lighter(&mut self) {
        self.weight_kg = (self.weight_kg - WEIGHT_STEP_KG).max(0.0);
    }
}
