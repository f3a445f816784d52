//! Desktop host for the image compressor component.
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use iced::font::{Family, Weight};
use iced::widget::{button, checkbox, column, container, row, scrollable, slider, text, text_input, Space};
use iced::{executor, Application, Command, Element, Font, Length, Settings, Theme};
use image_compressor::{
    config, logging, Config, Event, EventReceiver, ImageCompressor, MemoryProvider, PickerResult,
    LOG_TAG,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

const HEADING_FONT: Font = Font {
    family: Family::SansSerif,
    weight: Weight::Bold,
    stretch: iced::font::Stretch::Normal,
    monospaced: false,
};

const BODY_FONT: Font = Font {
    family: Family::SansSerif,
    weight: Weight::Normal,
    stretch: iced::font::Stretch::Normal,
    monospaced: false,
};

const CONFIG_ENV: &str = "IMAGE_COMPRESSOR_CONFIG";
const DEFAULT_QUALITY: u8 = 80;

pub fn main() -> iced::Result {
    let config_path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
    let loaded = config::load_config_or_default(config_path.as_deref());
    let config = match &loaded {
        Ok(config) => config.clone(),
        Err(_) => Config::default(),
    };

    logging::init(config.log_enabled);
    if let Err(e) = loaded {
        tracing::warn!(target: LOG_TAG, "{}; using defaults", e);
    }

    CompressorApp::run(Settings {
        window: iced::window::Settings {
            size: (520, 600),
            min_size: Some((460, 480)),
            resizable: true,
            decorations: true,
            ..Default::default()
        },
        default_font: BODY_FONT,
        default_text_size: 14.0,
        flags: config,
        ..Default::default()
    })
}

struct CompressorApp {
    component: ImageCompressor,
    events: Arc<Mutex<EventReceiver>>,
    selected_path: String,
    image_name: String,
    quality: u8,
    next_id: i32,
    pending: usize,
    status_message: String,
    results: Vec<Event>,
}

#[derive(Debug, Clone)]
enum Message {
    SelectFile,
    PickerReturned(PickerResult),
    ImageNameChanged(String),
    QualityChanged(u8),
    LogToggled(bool),
    Compress,
    EventReceived(Option<Event>),
    OpenOutputFolder,
    ClearResults,
}

impl Application for CompressorApp {
    type Message = Message;
    type Theme = Theme;
    type Executor = executor::Default;
    type Flags = Config;

    fn new(config: Config) -> (Self, Command<Message>) {
        // Every reference a desktop picker hands back is a file:// URI, so
        // no provider rows are needed.
        let (component, events) = ImageCompressor::new(&config, Arc::new(MemoryProvider::new()));

        let app = Self {
            component,
            events: Arc::new(Mutex::new(events)),
            selected_path: String::new(),
            image_name: String::new(),
            quality: DEFAULT_QUALITY,
            next_id: 1,
            pending: 0,
            status_message: String::new(),
            results: Vec::new(),
        };
        (app, Command::none())
    }

    fn title(&self) -> String {
        String::from("Image Compressor")
    }

    fn update(&mut self, message: Message) -> Command<Message> {
        match message {
            Message::SelectFile => {
                return Command::perform(select_file(), Message::PickerReturned);
            }
            Message::PickerReturned(result) => {
                let selected = matches!(result, PickerResult::Selected(_));
                self.component.picker_result(result);
                if selected {
                    return Command::perform(next_event(self.events.clone()), Message::EventReceived);
                }
            }
            Message::ImageNameChanged(value) => {
                self.image_name = value;
            }
            Message::QualityChanged(quality) => {
                self.quality = quality;
            }
            Message::LogToggled(enabled) => {
                self.component.set_log_enabled(enabled);
            }
            Message::Compress => {
                let id = self.next_id;
                self.next_id += 1;
                self.pending += 1;
                self.status_message = format!("Compressing ({} pending)", self.pending);

                let component = self.component.clone();
                let events = self.events.clone();
                let path = self.selected_path.clone();
                let name = self.image_name.clone();
                let quality = i32::from(self.quality);

                return Command::perform(
                    async move {
                        let _ = component.compress_image(&path, &name, quality, id).await;
                        next_event(events).await
                    },
                    Message::EventReceived,
                );
            }
            Message::EventReceived(Some(event)) => match event {
                Event::Selected { path } => {
                    if path.is_empty() {
                        self.status_message = String::from("Could not resolve the selected image");
                    } else {
                        if self.image_name.is_empty() {
                            self.image_name = default_name(&path);
                        }
                        self.selected_path = path;
                        self.status_message.clear();
                    }
                }
                event => {
                    self.pending = self.pending.saturating_sub(1);
                    self.status_message = if self.pending > 0 {
                        format!("Compressing ({} pending)", self.pending)
                    } else {
                        format!("Processed {} images", self.results.len() + 1)
                    };
                    self.results.push(event);
                }
            },
            Message::EventReceived(None) => {}
            Message::OpenOutputFolder => {
                let output_dir = self.component.output_dir();
                if output_dir.exists() {
                    let _ = open::that(output_dir);
                }
            }
            Message::ClearResults => {
                self.results.clear();
                self.status_message.clear();
            }
        }
        Command::none()
    }

    fn view(&self) -> Element<Message> {
        let title = text("Image Compressor")
            .size(22)
            .font(HEADING_FONT);

        let file_selection = column![
            text("Select Image")
                .size(16)
                .font(HEADING_FONT),
            button("Select File")
                .on_press(Message::SelectFile)
                .padding([6, 12]),
            if self.selected_path.is_empty() {
                text("No file selected")
                    .size(12)
                    .font(BODY_FONT)
            } else {
                text(format!("Selected: {}", truncate(&self.selected_path, 60)))
                    .size(12)
                    .font(BODY_FONT)
            }
        ].spacing(8);

        let settings = column![
            text("Output")
                .size(16)
                .font(HEADING_FONT),
            row![
                text("Name:")
                    .size(13)
                    .font(BODY_FONT)
                    .width(80),
                text_input("Base name", &self.image_name)
                    .on_input(Message::ImageNameChanged)
                    .width(Length::Fill)
                    .padding(4)
                    .size(13),
            ].spacing(8),
            row![
                text("Quality:")
                    .size(13)
                    .font(BODY_FONT)
                    .width(80),
                slider(0..=100, self.quality, Message::QualityChanged)
                    .width(Length::Fill),
                text(format!("{}%", self.quality))
                    .size(13)
                    .font(BODY_FONT)
                    .width(40),
            ].spacing(8),
            checkbox("Verbose logging", self.component.log_enabled(), Message::LogToggled)
                .size(13)
                .spacing(8),
        ].spacing(8);

        let compress_button = if !self.selected_path.is_empty() && !self.image_name.is_empty() {
            button("Compress")
                .on_press(Message::Compress)
                .padding([8, 16])
        } else {
            button("Compress")
                .padding([8, 16])
        };

        let status = text(&self.status_message)
            .size(12)
            .font(BODY_FONT);

        let results_section = if !self.results.is_empty() {
            let results_list: Vec<Element<Message>> = self.results.iter().map(|event| {
                let (status, detail) = match event {
                    Event::Saved { id, path } => ("[OK]", format!("#{} {}", id, path)),
                    Event::Error { message } => ("[FAIL]", message.clone()),
                    Event::Selected { path } => ("[SEL]", path.clone()),
                };

                row![
                    text(status)
                        .size(12)
                        .font(HEADING_FONT)
                        .width(50),
                    text(detail)
                        .size(12)
                        .font(BODY_FONT)
                        .width(Length::Fill),
                ].spacing(8).into()
            }).collect();

            column![
                text("Results")
                    .size(16)
                    .font(HEADING_FONT),
                container(
                    scrollable(
                        column(results_list).spacing(3)
                    ).height(Length::Fixed(140.0))
                )
                .style(iced::theme::Container::Box)
                .padding(8),
                row![
                    button("Open Output")
                        .on_press(Message::OpenOutputFolder)
                        .padding([6, 12]),
                    button("Clear")
                        .on_press(Message::ClearResults)
                        .padding([6, 12]),
                ].spacing(8)
            ].spacing(8)
        } else {
            column![]
        };

        let content = column![
            title,
            Space::with_height(12),
            file_selection,
            Space::with_height(12),
            settings,
            Space::with_height(12),
            compress_button,
            Space::with_height(8),
            status,
            Space::with_height(12),
            results_section,
        ]
        .padding(16);

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn theme(&self) -> Theme {
        Theme::Light
    }
}

async fn select_file() -> PickerResult {
    rfd::AsyncFileDialog::new()
        .add_filter("Images", &["jpg", "jpeg", "png", "webp", "gif", "bmp"])
        .pick_file()
        .await
        .and_then(|handle| url::Url::from_file_path(handle.path()).ok())
        .map(|uri| PickerResult::Selected(uri.to_string()))
        .unwrap_or(PickerResult::Cancelled)
}

async fn next_event(events: Arc<Mutex<EventReceiver>>) -> Option<Event> {
    events.lock().await.recv().await
}

fn default_name(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .map(|stem| format!("{}_compressed", stem.to_string_lossy()))
        .unwrap_or_default()
}

fn truncate(value: &str, max_chars: usize) -> String {
    let count = value.chars().count();
    if count > max_chars {
        let tail: String = value.chars().skip(count - (max_chars - 3)).collect();
        format!("...{}", tail)
    } else {
        value.to_string()
    }
}
