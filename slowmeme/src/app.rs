//! slowMeme - pick a template, drop text on it, save a PNG

use std::sync::Arc;

use egui::{Context, Key, Rect, Sense, Stroke, TextEdit, Vec2};
use memecore::catalog::{self, TEMPLATES};
use memecore::composition::{LayerId, MAX_FONT_SIZE, MIN_FONT_SIZE};
use memecore::error::BackendError;
use memecore::render;
use memecore::gallery::{begin_publish, MemeListing, MemeRecord, PublishTask};
use memecore::session::AuthSession;
use memecore::task::{Task, TaskState};
use memecore::{ExportJob, ExportOutcome, ExportedMeme, Exporter, ImageSource, MemeConfig, SessionContext, Surface, UploadedFile};

use crate::browser::{pictures_dir, FileBrowser};
use crate::repaint::RepaintController;
use crate::textures::{Slot, TextureCache};
use crate::theme::{menu_bar, SlowColors};
use crate::widgets::{status_bar, toolbar_separator, window_control_buttons, FileListItem, SlowButton, WindowAction};

/// Side of the square editing surface, in points.
pub const SURFACE_SIZE: f32 = 500.0;
const HANDLE_SIZE: f32 = 12.0;
const THUMB_SIZE: f32 = 64.0;
const GALLERY_TILE: f32 = 220.0;
/// Where egui's `TextEdit` puts its first glyph inside the field.
const TEXT_MARGIN: Vec2 = Vec2::new(4.0, 2.0);
const OUTLINE_OFFSETS: [(f32, f32); 8] =
    [(-1.0, -1.0), (0.0, -1.0), (1.0, -1.0), (-1.0, 0.0), (1.0, 0.0), (-1.0, 1.0), (0.0, 1.0), (1.0, 1.0)];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Home,
    Generator,
    SignIn,
}

type AuthTask = Task<Result<AuthSession, BackendError>>;

pub struct SlowMemeApp {
    config: MemeConfig,
    surface: Surface,
    session: SessionContext,
    exporter: Exporter,
    listing: Option<Arc<dyn MemeListing>>,
    textures: TextureCache,
    view: View,

    export_job: Option<ExportJob>,
    publish_task: Option<PublishTask>,
    sign_out_task: Option<Task<Result<(), BackendError>>>,
    restore_task: Option<AuthTask>,
    sign_in_task: Option<AuthTask>,
    gallery_task: Option<Task<Result<Vec<MemeRecord>, BackendError>>>,
    gallery: Option<Vec<MemeRecord>>,

    email: String,
    password: String,
    sign_in_error: Option<String>,

    show_file_browser: bool,
    file_browser: FileBrowser,
    show_about: bool,
    status: String,
    repaint: RepaintController,
}

/// Result of a finished task, clearing the slot. `Some(None)` if the
/// worker died.
fn take_finished<T: Send + 'static>(slot: &mut Option<Task<T>>) -> Option<Option<T>> {
    let state = slot.as_ref()?.poll();
    match state {
        TaskState::Running => None,
        TaskState::Done(value) => {
            *slot = None;
            Some(Some(value))
        }
        TaskState::Lost => {
            *slot = None;
            Some(None)
        }
    }
}

/// Fill and outline of layer text, the same colors the export paints.
fn layer_text_colors() -> (egui::Color32, egui::Color32) {
    let rgba = |[r, g, b, a]: [u8; 4]| egui::Color32::from_rgba_unmultiplied(r, g, b, a);
    (rgba(render::TEXT_FILL), rgba(render::TEXT_OUTLINE))
}

/// Largest rect with `size`'s aspect ratio that fits centered in `frame`.
pub fn letterbox(frame: Rect, size: Vec2) -> Rect {
    if size.x <= 0.0 || size.y <= 0.0 {
        return frame;
    }
    let scale = (frame.width() / size.x).min(frame.height() / size.y);
    Rect::from_center_size(frame.center(), size * scale)
}

impl SlowMemeApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: MemeConfig) -> Self {
        let fetcher = config.fetcher();
        let session = config.session();
        let restore_task = session.begin_restore();
        Self {
            surface: Surface::with_drag_offset(config.drag_offset),
            exporter: config.exporter(fetcher.clone()),
            listing: config.listing(),
            textures: TextureCache::new(fetcher, config.load_timeout()),
            session,
            view: View::Generator,
            export_job: None,
            publish_task: None,
            sign_out_task: None,
            restore_task,
            sign_in_task: None,
            gallery_task: None,
            gallery: None,
            email: String::new(),
            password: String::new(),
            sign_in_error: None,
            show_file_browser: false,
            file_browser: FileBrowser::new(pictures_dir()),
            show_about: false,
            status: String::new(),
            repaint: RepaintController::new(),
            config,
        }
    }

    fn is_busy(&self) -> bool {
        self.export_job.is_some()
            || self.publish_task.is_some()
            || self.sign_out_task.is_some()
            || self.restore_task.is_some()
            || self.sign_in_task.is_some()
            || self.gallery_task.is_some()
            || self.textures.is_loading()
    }

    // ---------------------------------------------------------------
    // Actions
    // ---------------------------------------------------------------

    fn go(&mut self, view: View) {
        if view == View::Home {
            self.refresh_gallery(false);
        }
        self.view = view;
    }

    fn new_meme(&mut self) {
        self.surface.reset();
        self.status = "new meme".into();
    }

    fn add_text(&mut self) {
        self.surface.add_text_layer();
        self.status.clear();
    }

    fn upload(&mut self, path: &std::path::Path) {
        match UploadedFile::read(path) {
            Ok(file) => {
                self.status = format!("using {}", file.name);
                self.surface.upload_image(Some(file));
            }
            Err(e) => {
                log::warn!("cannot read {}: {}", path.display(), e);
                self.status = format!("could not read {}: {}", path.display(), e);
            }
        }
    }

    fn save_and_download(&mut self) {
        if self.export_job.is_some() {
            return;
        }
        let snapshot = self.surface.snapshot();
        match self.exporter.export(&snapshot, self.session.is_signed_in()) {
            ExportOutcome::AuthenticationRequired => {
                self.status = "sign in to save memes".into();
                self.go(View::SignIn);
            }
            ExportOutcome::Started(job) => {
                self.status = "rendering...".into();
                self.export_job = Some(job);
            }
        }
    }

    fn publish(&mut self, meme: &ExportedMeme) {
        if let Some(task) = begin_publish(self.config.publish_on_export, self.listing.as_ref(), &self.session, meme) {
            self.publish_task = Some(task);
        }
    }

    fn start_sign_in(&mut self) {
        if self.sign_in_task.is_some() {
            return;
        }
        let email = self.email.trim().to_string();
        if email.is_empty() || self.password.is_empty() {
            self.sign_in_error = Some("enter an email and a password".into());
            return;
        }
        self.sign_in_error = None;
        self.sign_in_task = Some(self.session.begin_sign_in(&email, &self.password));
    }

    fn sign_out(&mut self) {
        // Local state goes now; the remote logout finishes in the background
        if let Some(task) = self.session.begin_sign_out() {
            self.sign_out_task = Some(task);
        }
        self.gallery = None;
        self.gallery_task = None;
        self.status = "signed out".into();
        self.go(View::Home);
    }

    fn refresh_gallery(&mut self, force: bool) {
        if !self.session.is_signed_in() || self.gallery_task.is_some() {
            return;
        }
        if self.gallery.is_some() && !force {
            return;
        }
        let Some(listing) = self.listing.clone() else {
            return;
        };
        let token = self.session.access_token().map(str::to_string);
        self.gallery_task = Some(Task::spawn(move || listing.recent(token.as_deref())));
    }

    // ---------------------------------------------------------------
    // Background work
    // ---------------------------------------------------------------

    fn poll_background(&mut self, ctx: &Context) {
        if self.textures.poll(ctx) {
            self.repaint.mark_needs_repaint();
        }

        if let Some(result) = take_finished(&mut self.restore_task) {
            match result {
                Some(result) => self.session.finish_restore(result),
                None => log::warn!("session restore worker lost"),
            }
            if self.view == View::Home {
                self.refresh_gallery(false);
            }
            self.repaint.mark_needs_repaint();
        }

        if let Some(result) = take_finished(&mut self.sign_in_task) {
            let result = result.unwrap_or_else(|| Err(BackendError::NotConfigured));
            match self.session.finish_sign_in(result) {
                Ok(()) => {
                    self.password.clear();
                    self.status = match self.session.current_user() {
                        Some(user) => format!("signed in as {}", user.email.as_deref().unwrap_or(&user.id)),
                        None => "signed in".into(),
                    };
                    self.go(View::Home);
                }
                Err(e) => self.sign_in_error = Some(e.to_string()),
            }
            self.repaint.mark_needs_repaint();
        }

        let finished = self.export_job.as_ref().and_then(ExportJob::poll);
        if let Some(result) = finished {
            self.export_job = None;
            match result {
                Ok(meme) => {
                    self.status = format!("saved {} ({}×{})", meme.path.display(), meme.width, meme.height);
                    self.publish(&meme);
                }
                Err(e) => self.status = format!("export failed: {}", e),
            }
            self.repaint.mark_needs_repaint();
        }

        if let Some(result) = take_finished(&mut self.publish_task) {
            match result {
                Some(Ok(record)) => {
                    self.status = "shared to the gallery".into();
                    if let Some(gallery) = &mut self.gallery {
                        gallery.insert(0, record);
                    }
                }
                Some(Err(e)) => self.status = format!("could not share: {}", e),
                None => self.status = "could not share: worker lost".into(),
            }
            self.repaint.mark_needs_repaint();
        }

        if let Some(result) = take_finished(&mut self.sign_out_task) {
            match result {
                Some(Ok(())) => log::debug!("remote session closed"),
                Some(Err(e)) => log::warn!("sign out: {}", e),
                None => log::warn!("sign out worker lost"),
            }
        }

        if let Some(result) = take_finished(&mut self.gallery_task) {
            match result {
                Some(Ok(memes)) => self.gallery = Some(memes),
                Some(Err(e)) => {
                    log::warn!("gallery: {}", e);
                    self.status = format!("could not load memes: {}", e);
                    self.gallery = Some(Vec::new());
                }
                None => self.gallery = Some(Vec::new()),
            }
            self.repaint.mark_needs_repaint();
        }
    }

    fn handle_keyboard(&mut self, ctx: &Context) {
        let (save, open, new) = ctx.input(|i| {
            let cmd = i.modifiers.command;
            (cmd && i.key_pressed(Key::S), cmd && i.key_pressed(Key::O), cmd && i.key_pressed(Key::N))
        });
        if self.view != View::Generator {
            return;
        }
        if save {
            self.save_and_download();
        }
        if open {
            self.show_file_browser = true;
        }
        if new {
            self.new_meme();
        }
    }

    // ---------------------------------------------------------------
    // Chrome
    // ---------------------------------------------------------------

    fn render_menu_bar(&mut self, ui: &mut egui::Ui) -> WindowAction {
        let mut action = WindowAction::None;
        menu_bar(ui, |ui| {
            action = window_control_buttons(ui);
            ui.menu_button("file", |ui| {
                if ui.button("new meme     ⌘N").clicked() {
                    self.new_meme();
                    self.go(View::Generator);
                    ui.close_menu();
                }
                if ui.button("upload...    ⌘O").clicked() {
                    self.show_file_browser = true;
                    self.go(View::Generator);
                    ui.close_menu();
                }
                ui.separator();
                if ui.add_enabled(self.export_job.is_none(), egui::Button::new("save & download  ⌘S")).clicked() {
                    self.save_and_download();
                    ui.close_menu();
                }
            });
            ui.menu_button("help", |ui| {
                if ui.button("about").clicked() {
                    self.show_about = true;
                    ui.close_menu();
                }
            });

            toolbar_separator(ui);
            if ui.add(SlowButton::new("home").selected(self.view == View::Home)).clicked() {
                self.go(View::Home);
            }
            if ui.add(SlowButton::new("create").selected(self.view == View::Generator)).clicked() {
                self.go(View::Generator);
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if self.session.is_signed_in() {
                    if ui.add(SlowButton::new("sign out")).clicked() {
                        self.sign_out();
                    }
                    if let Some(user) = self.session.current_user() {
                        ui.label(user.email.as_deref().unwrap_or(&user.id));
                    }
                } else if ui.add(SlowButton::new("sign in").selected(self.view == View::SignIn)).clicked() {
                    self.go(View::SignIn);
                }
            });
        });
        action
    }

    fn status_text(&self) -> String {
        if !self.status.is_empty() {
            return self.status.clone();
        }
        let comp = self.surface.composition();
        let background = TEMPLATES
            .iter()
            .find(|t| t.source() == comp.background)
            .map(|t| t.name.to_string())
            .unwrap_or_else(|| "uploaded image".into());
        let who = match self.session.current_user() {
            Some(user) => user.email.clone().unwrap_or_else(|| user.id.clone()),
            None => "not signed in".into(),
        };
        format!(
            "{}  |  {} text  |  {}px  |  {}",
            background,
            comp.layers.len(),
            comp.font_size,
            who
        )
    }

    // ---------------------------------------------------------------
    // Generator
    // ---------------------------------------------------------------

    fn render_generator(&mut self, ui: &mut egui::Ui) {
        self.render_template_strip(ui);
        ui.add_space(6.0);
        self.render_tools(ui);
        ui.add_space(6.0);
        ui.vertical_centered(|ui| self.render_surface(ui));
    }

    fn render_template_strip(&mut self, ui: &mut egui::Ui) {
        let current = self.surface.composition().background.clone();
        egui::ScrollArea::horizontal().id_source("templates").show(ui, |ui| {
            ui.horizontal(|ui| {
                for template in TEMPLATES {
                    let source = template.source();
                    let key = self.textures.request(&source);
                    let selected = source == current;

                    let (rect, resp) = ui.allocate_exact_size(egui::vec2(THUMB_SIZE, THUMB_SIZE + 16.0), Sense::click());
                    let thumb = Rect::from_min_size(rect.min, egui::vec2(THUMB_SIZE, THUMB_SIZE));
                    let painter = ui.painter();
                    painter.rect_filled(thumb, 0.0, SlowColors::WHITE);
                    if let Some(tex) = self.textures.texture(&key) {
                        let uv = Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
                        painter.image(tex.id(), letterbox(thumb, tex.size_vec2()), uv, egui::Color32::WHITE);
                    }
                    let stroke_width = if selected { 3.0 } else { 1.0 };
                    painter.rect_stroke(thumb, 0.0, Stroke::new(stroke_width, SlowColors::BLACK));
                    painter.text(
                        egui::pos2(thumb.center().x, thumb.bottom() + 8.0),
                        egui::Align2::CENTER_CENTER,
                        template.name,
                        egui::FontId::proportional(10.0),
                        SlowColors::BLACK,
                    );

                    if resp.clicked() {
                        self.textures.retry(&key);
                        self.surface.select_template(source);
                        self.status.clear();
                    }
                    resp.on_hover_text(template.name);
                }
            });
        });
    }

    fn render_tools(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.add(SlowButton::new("upload")).clicked() {
                self.show_file_browser = true;
            }
            if ui.add(SlowButton::new("add text")).clicked() {
                self.add_text();
            }
            toolbar_separator(ui);

            let mut size = self.surface.composition().font_size;
            let slider = egui::Slider::new(&mut size, MIN_FONT_SIZE..=MAX_FONT_SIZE)
                .text("font size")
                .integer();
            if ui.add(slider).changed() {
                self.surface.set_font_size(size);
            }
            toolbar_separator(ui);

            if ui.add(SlowButton::new("new")).clicked() {
                self.new_meme();
            }
            let saving = self.export_job.is_some();
            let label = if saving { "saving..." } else { "save & download" };
            if ui.add_enabled(!saving, SlowButton::new(label)).clicked() {
                self.save_and_download();
            }
        });
    }

    fn render_surface(&mut self, ui: &mut egui::Ui) {
        let (rect, _) = ui.allocate_exact_size(egui::vec2(SURFACE_SIZE, SURFACE_SIZE), Sense::hover());
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, SlowColors::WHITE);

        let background = self.surface.composition().background.clone();
        let key = self.textures.request(&background);
        match self.textures.get(&key) {
            Some(Slot::Ready(tex)) => {
                let uv = Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
                painter.image(tex.id(), letterbox(rect, tex.size_vec2()), uv, egui::Color32::WHITE);
            }
            Some(Slot::Failed(msg)) => {
                painter.text(
                    rect.center(),
                    egui::Align2::CENTER_CENTER,
                    format!("could not load image\n{}", msg),
                    egui::FontId::proportional(14.0),
                    SlowColors::BLACK,
                );
            }
            _ => {
                painter.text(
                    rect.center(),
                    egui::Align2::CENTER_CENTER,
                    "loading...",
                    egui::FontId::proportional(14.0),
                    SlowColors::BLACK,
                );
            }
        }

        let font_size = self.surface.composition().font_size;
        let font = egui::FontId::proportional(font_size);
        let layers: Vec<(LayerId, String, f32, f32)> = self
            .surface
            .composition()
            .layers
            .iter()
            .map(|l| (l.id, l.text.clone(), l.x, l.y))
            .collect();

        let mut child = ui.child_ui(rect, egui::Layout::left_to_right(egui::Align::TOP));
        child.set_clip_rect(rect);

        for (id, mut text, x, y) in layers {
            let origin = rect.min + egui::vec2(x, y);

            let handle = Rect::from_min_size(origin - egui::vec2(HANDLE_SIZE + 2.0, 0.0), Vec2::splat(HANDLE_SIZE));
            let handle_resp = child
                .interact(handle, child.id().with(("handle", id.as_u64())), Sense::drag())
                .on_hover_cursor(egui::CursorIcon::Grab);
            let dragging = self.surface.drag().active() == Some(id);
            child.painter().rect_filled(handle, 0.0, if dragging { SlowColors::BLACK } else { SlowColors::WHITE });
            child.painter().rect_stroke(handle, 0.0, Stroke::new(1.0, SlowColors::BLACK));
            if handle_resp.drag_started() {
                self.surface.begin_drag(id);
            }

            let width = child
                .fonts(|f| f.layout_no_wrap(text.clone(), font.clone(), SlowColors::BLACK).size().x)
                .max(40.0)
                + 12.0;
            let field = Rect::from_min_size(origin, egui::vec2(width, font_size + 8.0));
            // Same look as the export: white fill over a black outline
            let glyphs = field.min + TEXT_MARGIN;
            let (fill, stroke) = layer_text_colors();
            let outline = render::outline_width(font_size).max(1.0);
            for (dx, dy) in OUTLINE_OFFSETS {
                child.painter().text(
                    glyphs + egui::vec2(dx, dy) * outline,
                    egui::Align2::LEFT_TOP,
                    &text,
                    font.clone(),
                    stroke,
                );
            }
            let resp = child.put(
                field,
                TextEdit::singleline(&mut text)
                    .id(child.id().with(("layer", id.as_u64())))
                    .font(font.clone())
                    .text_color(fill)
                    .frame(false)
                    .desired_width(width),
            );
            if resp.changed() {
                self.surface.edit_text_layer(id, text);
            }
        }

        if self.surface.drag().is_active() {
            let (pointer, released) = ui.input(|i| (i.pointer.interact_pos(), i.pointer.any_released()));
            if let Some(pos) = pointer {
                let local = pos - rect.min;
                if self.surface.update_drag_position(local.x, local.y) {
                    self.repaint.mark_needs_repaint();
                }
            }
            if released {
                self.surface.end_drag();
            }
        }

        ui.painter().rect_stroke(rect, 0.0, Stroke::new(1.0, SlowColors::BLACK));
    }

    fn render_file_browser(&mut self, ctx: &Context) {
        let mut open_path = None;
        egui::Window::new("upload image")
            .collapsible(false)
            .resizable(false)
            .default_width(450.0)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label("location:");
                    ui.label(self.file_browser.current_dir.to_string_lossy().to_string());
                });
                ui.separator();

                egui::ScrollArea::vertical().max_height(300.0).show(ui, |ui| {
                    let mut clicked_idx = None;
                    let mut nav_path = None;
                    for (idx, entry) in self.file_browser.entries.iter().enumerate() {
                        let selected = self.file_browser.selected_index == Some(idx);
                        let response = ui.add(FileListItem::new(&entry.name, entry.is_directory).selected(selected));
                        if response.clicked() {
                            clicked_idx = Some(idx);
                        }
                        if response.double_clicked() {
                            if entry.is_directory {
                                nav_path = Some(entry.path.clone());
                            } else {
                                open_path = Some(entry.path.clone());
                            }
                        }
                    }
                    if let Some(idx) = clicked_idx {
                        self.file_browser.selected_index = Some(idx);
                    }
                    if let Some(path) = nav_path {
                        self.file_browser.navigate_to(path);
                    }
                });

                ui.separator();
                ui.horizontal(|ui| {
                    if ui.button("cancel").clicked() {
                        self.show_file_browser = false;
                    }
                    if ui.button("open").clicked() {
                        open_path = self.file_browser.selected_file().map(|p| p.to_path_buf());
                    }
                });
            });

        if let Some(path) = open_path {
            self.upload(&path);
            self.show_file_browser = false;
        }
    }

    // ---------------------------------------------------------------
    // Home and sign-in
    // ---------------------------------------------------------------

    fn render_home(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("slowMeme");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.add(SlowButton::new("create new meme")).clicked() {
                    self.go(View::Generator);
                }
            });
        });
        ui.separator();

        if !self.session.is_signed_in() {
            ui.add_space(40.0);
            ui.vertical_centered(|ui| {
                ui.heading("join in");
                ui.add_space(8.0);
                ui.label("sign in to see everyone's memes and save your own.");
                ui.add_space(12.0);
                if ui.add(SlowButton::new("get started")).clicked() {
                    self.go(View::SignIn);
                }
            });
            return;
        }

        if self.listing.is_none() {
            ui.label("no gallery configured.");
            return;
        }

        let memes = match &self.gallery {
            Some(memes) => memes.clone(),
            None => {
                ui.label("loading memes...");
                return;
            }
        };
        if ui.add(SlowButton::new("refresh")).clicked() {
            self.refresh_gallery(true);
        }
        if memes.is_empty() {
            ui.label("nothing here yet.");
            return;
        }

        egui::ScrollArea::vertical().show(ui, |ui| {
            ui.horizontal_wrapped(|ui| {
                for meme in &memes {
                    self.render_gallery_tile(ui, meme);
                }
            });
        });
    }

    fn render_gallery_tile(&mut self, ui: &mut egui::Ui, meme: &MemeRecord) {
        let source = ImageSource::url(meme.image_url.clone());
        let key = self.textures.request(&source);
        let (rect, _) = ui.allocate_exact_size(egui::vec2(GALLERY_TILE, GALLERY_TILE + 18.0), Sense::hover());
        let tile = Rect::from_min_size(rect.min, Vec2::splat(GALLERY_TILE));
        let painter = ui.painter();
        painter.rect_filled(tile, 0.0, SlowColors::WHITE);
        match self.textures.get(&key) {
            Some(Slot::Ready(tex)) => {
                let uv = Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
                painter.image(tex.id(), letterbox(tile, tex.size_vec2()), uv, egui::Color32::WHITE);
            }
            Some(Slot::Failed(_)) => {
                painter.text(tile.center(), egui::Align2::CENTER_CENTER, "unavailable", egui::FontId::proportional(12.0), SlowColors::BLACK);
            }
            _ => {
                painter.text(tile.center(), egui::Align2::CENTER_CENTER, "loading...", egui::FontId::proportional(12.0), SlowColors::BLACK);
            }
        }
        painter.rect_stroke(tile, 0.0, Stroke::new(1.0, SlowColors::BLACK));
        painter.text(
            egui::pos2(tile.left(), tile.bottom() + 9.0),
            egui::Align2::LEFT_CENTER,
            format!("created {}", meme.created_at.format("%Y-%m-%d")),
            egui::FontId::proportional(11.0),
            SlowColors::BLACK,
        );
    }

    fn render_sign_in(&mut self, ui: &mut egui::Ui) {
        ui.add_space(40.0);
        ui.vertical_centered(|ui| {
            ui.heading("sign in");
            ui.add_space(12.0);

            if !self.session.has_backend() {
                ui.label("no account service is configured.");
                ui.label("set SLOWMEME_BACKEND_URL and SLOWMEME_BACKEND_KEY to sign in.");
                return;
            }

            let width = 260.0;
            ui.add(TextEdit::singleline(&mut self.email).hint_text("email").desired_width(width));
            let pw = ui.add(
                TextEdit::singleline(&mut self.password)
                    .password(true)
                    .hint_text("password")
                    .desired_width(width),
            );
            let submitted = pw.lost_focus() && ui.input(|i| i.key_pressed(Key::Enter));
            ui.add_space(8.0);

            let waiting = self.sign_in_task.is_some();
            let label = if waiting { "signing in..." } else { "sign in" };
            if ui.add_enabled(!waiting, SlowButton::new(label)).clicked() || submitted {
                self.start_sign_in();
            }
            if let Some(err) = &self.sign_in_error {
                ui.add_space(8.0);
                ui.label(err.as_str());
            }
        });
    }

    fn render_about(&mut self, ctx: &Context) {
        egui::Window::new("about slowMeme")
            .collapsible(false)
            .resizable(false)
            .default_width(300.0)
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    ui.heading("slowMeme");
                    ui.label(format!("version {}", env!("CARGO_PKG_VERSION")));
                    ui.add_space(8.0);
                    ui.label("a minimal meme maker");
                });
                ui.add_space(8.0);
                ui.separator();
                ui.label(format!("memes are saved to {}", self.exporter.output_path().display()));
                ui.label(format!("{} templates", TEMPLATES.len()));
                ui.label(format!("default: {}", catalog::default_template().name));
                ui.add_space(8.0);
                ui.vertical_centered(|ui| {
                    if ui.button("ok").clicked() {
                        self.show_about = false;
                    }
                });
            });
    }

    fn frame(&mut self, ctx: &Context) {
        self.poll_background(ctx);
        self.handle_keyboard(ctx);

        let mut win_action = WindowAction::None;
        egui::TopBottomPanel::top("menu").show(ctx, |ui| {
            win_action = self.render_menu_bar(ui);
        });
        match win_action {
            WindowAction::Close => ctx.send_viewport_cmd(egui::ViewportCommand::Close),
            WindowAction::Minimize => ctx.send_viewport_cmd(egui::ViewportCommand::Minimized(true)),
            WindowAction::None => {}
        }

        let status = self.status_text();
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            status_bar(ui, &status);
        });

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(SlowColors::WHITE).inner_margin(8.0))
            .show(ctx, |ui| match self.view {
                View::Home => self.render_home(ui),
                View::Generator => self.render_generator(ui),
                View::SignIn => self.render_sign_in(ui),
            });

        if self.show_file_browser {
            self.render_file_browser(ctx);
        }
        if self.show_about {
            self.render_about(ctx);
        }
    }
}

impl eframe::App for SlowMemeApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.repaint.begin_frame();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| self.frame(ctx)));
        if result.is_err() {
            log::error!("caught panic in frame, recovered");
        }
        self.textures.end_frame();

        self.repaint.set_continuous(self.is_busy());
        self.repaint.end_frame(ctx);
    }
}
