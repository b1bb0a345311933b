/// Photo selection and preview
///
/// This module handles:
/// - Opening the native file chooser
/// - Decoding a downsized preview off the UI thread
/// - Making sure only the latest selection's preview is ever shown

use iced::widget::image::Handle;
use iced::widget::{button, column, container, text};
use iced::{Alignment, ContentFit, Element, Length};
use rfd::AsyncFileDialog;
use std::sync::Arc;
use tokio::task;

use crate::state::data::SelectedFile;

/// Extensions offered by the chooser's media filter
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif", "bmp", "heic", "heif"];

/// Longest edge of the decoded preview, in pixels
const PREVIEW_SIZE: u32 = 512;

/// Height of the picker area in the form
const AREA_HEIGHT: f32 = 256.0;

/// Show the native chooser and read the chosen file
///
/// Returns `None` when the user dismisses the dialog.
pub async fn pick_image() -> Option<SelectedFile> {
    let handle = AsyncFileDialog::new()
        .set_title("Choose a photo of your pet")
        .add_filter("Images", IMAGE_EXTENSIONS)
        .pick_file()
        .await?;

    let bytes = handle.read().await;
    Some(SelectedFile::new(handle.file_name(), bytes))
}

/// A decoded, display-ready preview
#[derive(Debug, Clone)]
pub struct Preview {
    pub handle: Handle,
    pub width: u32,
    pub height: u32,
}

/// Decode a preview for the given bytes
///
/// Spawns blocking because decoding and resizing is CPU-intensive
pub async fn load_preview(bytes: Arc<[u8]>) -> Result<Preview, String> {
    let (width, height, pixels) = task::spawn_blocking(move || decode_preview(&bytes))
        .await
        .map_err(|e| format!("Task join error: {}", e))??;

    Ok(Preview {
        handle: Handle::from_rgba(width, height, pixels),
        width,
        height,
    })
}

/// Blocking implementation of preview decoding
fn decode_preview(bytes: &[u8]) -> Result<(u32, u32, Vec<u8>), String> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| format!("Failed to decode image: {}", e))?;

    // thumbnail() keeps the aspect ratio and never upscales past the bounds
    let preview = if img.width() > PREVIEW_SIZE || img.height() > PREVIEW_SIZE {
        img.thumbnail(PREVIEW_SIZE, PREVIEW_SIZE)
    } else {
        img
    };

    let rgba = preview.to_rgba8();
    Ok((rgba.width(), rgba.height(), rgba.into_raw()))
}

/// What the picker area currently shows
#[derive(Debug, Clone, Default)]
pub enum PreviewState {
    #[default]
    Empty,
    Loading,
    Ready(Preview),
    /// The file could not be decoded locally; it can still be sent
    Unavailable,
}

/// Preview bookkeeping for the picker area
///
/// Every selection gets a ticket. A decoded preview is only installed if it
/// carries the ticket of the latest selection.
#[derive(Debug, Default)]
pub struct Picker {
    ticket: u64,
    preview: PreviewState,
}

impl Picker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new selection, dropping whatever preview was shown
    pub fn begin(&mut self) -> u64 {
        self.ticket += 1;
        self.preview = PreviewState::Loading;
        self.ticket
    }

    /// Install a finished preview if it belongs to the latest selection
    pub fn accept(&mut self, ticket: u64, result: Result<Preview, String>) -> bool {
        if ticket != self.ticket {
            tracing::debug!(ticket, latest = self.ticket, "Discarding stale preview");
            return false;
        }

        self.preview = match result {
            Ok(preview) => {
                tracing::debug!(width = preview.width, height = preview.height, "Preview ready");
                PreviewState::Ready(preview)
            }
            Err(err) => {
                tracing::warn!(error = %err, "⚠️  Preview unavailable");
                PreviewState::Unavailable
            }
        };
        true
    }

    pub fn preview(&self) -> &PreviewState {
        &self.preview
    }

    /// Build the picker area: preview (or placeholder) plus the choose button
    ///
    /// `on_choose` is `None` while the chooser must not be offered.
    pub fn view<'a, M: Clone + 'a>(
        &'a self,
        selected: Option<&'a SelectedFile>,
        on_choose: Option<M>,
    ) -> Element<'a, M> {
        let area: Element<'a, M> = match (&self.preview, selected) {
            (PreviewState::Ready(preview), _) => iced::widget::image(preview.handle.clone())
                .width(Length::Fill)
                .height(Length::Fixed(AREA_HEIGHT))
                .content_fit(ContentFit::Cover)
                .into(),
            (PreviewState::Unavailable, Some(file)) => {
                text(format!("No preview for {}, but it can still be styled.", file.name)).into()
            }
            (_, Some(file)) => text(format!("Loading {}...", file.name)).into(),
            (_, None) => column![
                text("Click \"Choose photo\" to upload").size(18),
                text("or drop your pet's photo onto this window").size(14),
            ]
            .spacing(4)
            .align_x(Alignment::Center)
            .into(),
        };

        let label = if selected.is_some() {
            "Change photo"
        } else {
            "Choose photo"
        };

        column![
            container(area)
                .width(Length::Fill)
                .height(Length::Fixed(AREA_HEIGHT))
                .center_x(Length::Fill)
                .center_y(Length::Fixed(AREA_HEIGHT))
                .style(container::bordered_box),
            button(label).on_press_maybe(on_choose).padding(10),
        ]
        .spacing(12)
        .into()
    }
}
