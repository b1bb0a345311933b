use iced::widget::image::Handle;
use iced::widget::{button, column, container, horizontal_space, row, scrollable, text, text_input, Column};
use iced::{event, time, window, Alignment, Element, Event, Length, Subscription, Task, Theme};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

mod client;
mod config;
mod download;
mod picker;
mod state;
mod ui;

use client::{EditRequestClient, GeminiClient, RequestError};
use config::Config;
use picker::{Picker, Preview};
use state::data::{GeneratedImage, SelectedFile};
use state::flow::{Flow, FlowState};
use ui::action::{self, Condition};

/// Interval between frames of the busy indicator
const BUSY_TICK: Duration = Duration::from_millis(350);

/// Main application state
struct PetStylist {
    config: Config,
    /// The image-editing service
    client: Arc<dyn EditRequestClient>,
    /// Upload/generate/result state machine
    flow: Flow,
    /// Preview bookkeeping for the chosen photo
    picker: Picker,
    /// Decoded result, rebuilt whenever the flow enters `Success`
    result_handle: Option<Handle>,
    /// Outcome of the last download, shown under the result
    download_status: Option<String>,
    /// Busy indicator frame
    tick: usize,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    /// User clicked "Choose photo"
    ChooseFile,
    /// The chooser closed (None if dismissed)
    FilePicked(Option<SelectedFile>),
    /// A file was dropped onto the window
    FileDropped(PathBuf),
    /// A dropped file finished loading
    FileLoaded(Result<SelectedFile, String>),
    /// Background preview decode finished for the given selection ticket
    PreviewLoaded(u64, Result<Preview, String>),
    InstructionChanged(String),
    Generate,
    /// The edit request resolved
    GenerationFinished(Result<GeneratedImage, RequestError>),
    Reset,
    Download,
    DownloadFinished(Result<Option<PathBuf>, String>),
    Tick,
}

impl PetStylist {
    /// Create a new instance of the application
    fn new() -> (Self, Task<Message>) {
        let config = Config::load();
        let client: Arc<dyn EditRequestClient> = Arc::new(GeminiClient::new(&config));

        tracing::info!("🐾 Pet Stylist ready");

        (
            PetStylist {
                config,
                client,
                flow: Flow::new(),
                picker: Picker::new(),
                result_handle: None,
                download_status: None,
                tick: 0,
            },
            Task::none(),
        )
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::ChooseFile => {
                if self.flow.is_processing() {
                    return Task::none();
                }
                Task::perform(picker::pick_image(), Message::FilePicked)
            }
            Message::FilePicked(Some(file)) => self.select(file),
            Message::FilePicked(None) => Task::none(),
            Message::FileDropped(path) => {
                if self.flow.is_processing() {
                    return Task::none();
                }
                Task::perform(
                    async move {
                        SelectedFile::from_path(path.clone())
                            .await
                            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))
                    },
                    Message::FileLoaded,
                )
            }
            Message::FileLoaded(Ok(file)) => self.select(file),
            Message::FileLoaded(Err(err)) => {
                tracing::warn!(error = %err, "⚠️  Could not load dropped file");
                Task::none()
            }
            Message::PreviewLoaded(ticket, result) => {
                self.picker.accept(ticket, result);
                Task::none()
            }
            Message::InstructionChanged(value) => {
                self.flow.set_instruction(value);
                Task::none()
            }
            Message::Generate => {
                let Some(request) = self.flow.begin_generation() else {
                    return Task::none();
                };
                self.tick = 0;
                Task::perform(
                    client::run(self.client.clone(), request),
                    Message::GenerationFinished,
                )
            }
            Message::GenerationFinished(outcome) => {
                self.flow.finish_generation(outcome);
                self.result_handle = self.flow.result().and_then(|image| match image.decode() {
                    Ok(bytes) => Some(Handle::from_bytes(bytes)),
                    Err(err) => {
                        tracing::warn!(error = %err, "⚠️  Result payload is not valid base64");
                        None
                    }
                });
                self.download_status = None;
                Task::none()
            }
            Message::Reset => {
                if self.flow.reset() {
                    self.result_handle = None;
                    self.download_status = None;
                }
                Task::none()
            }
            Message::Download => {
                let Some(image) = self.flow.result().cloned() else {
                    return Task::none();
                };
                Task::perform(
                    download::save_image(image, self.config.download_name.clone()),
                    Message::DownloadFinished,
                )
            }
            Message::DownloadFinished(result) => {
                self.download_status = match result {
                    Ok(Some(path)) => Some(format!("Saved to {}", path.display())),
                    Ok(None) => None,
                    Err(err) => {
                        tracing::error!(error = %err, "❌ Download failed");
                        Some("The image could not be saved.".to_string())
                    }
                };
                Task::none()
            }
            Message::Tick => {
                self.tick = self.tick.wrapping_add(1);
                Task::none()
            }
        }
    }

    /// Store a newly chosen file and start decoding its preview
    fn select(&mut self, file: SelectedFile) -> Task<Message> {
        let bytes = file.bytes.clone();
        if !self.flow.select_file(file) {
            return Task::none();
        }

        let ticket = self.picker.begin();
        Task::perform(picker::load_preview(bytes), move |result| {
            Message::PreviewLoaded(ticket, result)
        })
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let header = column![
            text("Pet Stylist").size(44),
            text("Custom beauty and colour styling for your pet").size(16),
        ]
        .spacing(6)
        .align_x(Alignment::Center);

        let body = match self.flow.state() {
            FlowState::Success(_) => self.success_view(),
            _ => self.form_view(),
        };

        let footer = row![
            text(format!("Dated: {}", chrono::Local::now().format("%Y-%m-%d"))).size(12),
            horizontal_space(),
            text(format!("Powered by {}", self.config.model)).size(12),
        ];

        let content = column![header, body, footer]
            .spacing(28)
            .padding(40)
            .max_width(760)
            .align_x(Alignment::Center);

        container(scrollable(container(content).center_x(Length::Fill)))
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    /// Upload + instruction form, shown in Idle, Processing and Error
    fn form_view(&self) -> Element<Message> {
        let processing = self.flow.is_processing();

        let picker = self.picker.view(
            self.flow.selected_file(),
            (!processing).then_some(Message::ChooseFile),
        );

        let mut input = text_input(
            "e.g. make my dog's tail pink, or turn its ears jade green...",
            self.flow.instruction(),
        )
        .padding(12);
        if !processing {
            input = input
                .on_input(Message::InstructionChanged)
                .on_submit(Message::Generate);
        }

        let mut form: Column<Message> = column![
            text("1. Choose a photo of your pet").size(18),
            picker,
            text("2. What change would you like?").size(18),
            input,
        ]
        .spacing(14);

        let message = self
            .flow
            .validation()
            .map(|v| v.to_string())
            .or_else(|| self.flow.error_message().map(str::to_string));
        if let Some(message) = message {
            form = form.push(text(message).style(text::danger));
        }

        form = form.push(action::action(
            "Show me the result",
            Condition::for_generate(&self.flow),
            Message::Generate,
            self.tick,
        ));

        if self.flow.error_message().is_some() {
            form = form.push(
                button("Start over")
                    .on_press(Message::Reset)
                    .style(button::secondary)
                    .padding(10),
            );
        }

        form.into()
    }

    /// Result view with reset and download actions
    fn success_view(&self) -> Element<Message> {
        let result: Element<Message> = match &self.result_handle {
            Some(handle) => iced::widget::image(handle.clone())
                .height(Length::Fixed(480.0))
                .into(),
            None => text("The result could not be displayed, but it can still be downloaded.").into(),
        };

        let actions = row![
            button(text("New design").width(Length::Fill).align_x(iced::alignment::Horizontal::Center))
                .on_press(Message::Reset)
                .style(button::secondary)
                .padding(14)
                .width(Length::Fill),
            button(text("Download image").width(Length::Fill).align_x(iced::alignment::Horizontal::Center))
                .on_press(Message::Download)
                .padding(14)
                .width(Length::Fill),
        ]
        .spacing(16);

        let mut view: Column<Message> = column![
            text("✨ Your design ✨").size(26),
            result,
            actions,
        ]
        .spacing(20)
        .align_x(Alignment::Center);

        if let Some(status) = &self.download_status {
            view = view.push(text(status.as_str()).size(14));
        }

        view.into()
    }

    /// File drops always; busy animation only while a request is in flight
    fn subscription(&self) -> Subscription<Message> {
        let drops = event::listen_with(|event, _status, _window| match event {
            Event::Window(window::Event::FileDropped(path)) => Some(Message::FileDropped(path)),
            _ => None,
        });

        if self.flow.is_processing() {
            Subscription::batch([drops, time::every(BUSY_TICK).map(|_| Message::Tick)])
        } else {
            drops
        }
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Light
    }
}

fn main() -> iced::Result {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("pet_stylist=info")),
        )
        .init();

    iced::application("Pet Stylist", PetStylist::update, PetStylist::view)
        .subscription(PetStylist::subscription)
        .theme(PetStylist::theme)
        .centered()
        .run_with(PetStylist::new)
}
