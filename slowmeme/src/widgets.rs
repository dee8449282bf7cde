//! Widgets for the slowMeme chrome

use egui::{Color32, Painter, Pos2, Rect, Response, Ui, Widget};

use crate::theme::SlowColors;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WindowAction {
    None,
    Close,
    Minimize,
}

/// Checkerboard overlay. `density` 1 covers every other pixel, larger
/// values spread it out.
pub fn draw_dither_rect(painter: &Painter, rect: Rect, color: Color32, density: u32) {
    let density = density.max(1) as i32;
    let x0 = rect.min.x.ceil() as i32;
    let y0 = rect.min.y.ceil() as i32;
    let x1 = rect.max.x.floor() as i32;
    let y1 = rect.max.y.floor() as i32;
    if x0 >= x1 || y0 >= y1 {
        return;
    }

    let pixel = egui::Vec2::splat(1.0);
    let mut y = y0;
    while y < y1 {
        let row_offset = if ((y - y0) / density) % 2 == 0 { 0 } else { density };
        let mut x = x0 + row_offset;
        while x < x1 {
            painter.rect_filled(Rect::from_min_size(Pos2::new(x as f32, y as f32), pixel), 0.0, color);
            x += density * 2;
        }
        y += density;
    }
}

pub fn draw_dither_hover(painter: &Painter, rect: Rect) {
    draw_dither_rect(painter, rect, SlowColors::BLACK, 2);
}

pub fn draw_dither_selection(painter: &Painter, rect: Rect) {
    draw_dither_rect(painter, rect, SlowColors::BLACK, 1);
}

/// Close and minimize boxes at the left of the menu bar.
pub fn window_control_buttons(ui: &mut Ui) -> WindowAction {
    let btn_size = egui::vec2(14.0, 14.0);
    let stroke = egui::Stroke::new(1.0, SlowColors::BLACK);
    let mut action = WindowAction::None;

    let (close_rect, close_resp) = ui.allocate_exact_size(btn_size, egui::Sense::click());
    if ui.is_rect_visible(close_rect) {
        let painter = ui.painter();
        painter.rect_filled(close_rect, 0.0, SlowColors::WHITE);
        painter.rect_stroke(close_rect, 0.0, stroke);
        if close_resp.hovered() {
            draw_dither_hover(painter, close_rect);
        }
        let m = 3.0;
        painter.line_segment(
            [close_rect.left_top() + egui::vec2(m, m), close_rect.right_bottom() - egui::vec2(m, m)],
            stroke,
        );
        painter.line_segment(
            [close_rect.right_top() + egui::vec2(-m, m), close_rect.left_bottom() + egui::vec2(m, -m)],
            stroke,
        );
    }
    if close_resp.clicked() {
        action = WindowAction::Close;
    }

    ui.add_space(2.0);

    let (min_rect, min_resp) = ui.allocate_exact_size(btn_size, egui::Sense::click());
    if ui.is_rect_visible(min_rect) {
        let painter = ui.painter();
        painter.rect_filled(min_rect, 0.0, SlowColors::WHITE);
        painter.rect_stroke(min_rect, 0.0, stroke);
        if min_resp.hovered() {
            draw_dither_hover(painter, min_rect);
        }
        let m = 3.0;
        painter.line_segment(
            [
                egui::pos2(min_rect.left() + m, min_rect.center().y),
                egui::pos2(min_rect.right() - m, min_rect.center().y),
            ],
            stroke,
        );
    }
    if min_resp.clicked() {
        action = WindowAction::Minimize;
    }

    ui.add_space(4.0);
    let (sep_rect, _) = ui.allocate_exact_size(egui::vec2(4.0, btn_size.y), egui::Sense::hover());
    if ui.is_rect_visible(sep_rect) {
        ui.painter().vline(sep_rect.center().x, sep_rect.y_range(), stroke);
    }
    ui.add_space(4.0);

    action
}

/// A button: white bg, 1px outline, dithered when pressed or selected.
pub struct SlowButton<'a> {
    text: &'a str,
    selected: bool,
}

impl<'a> SlowButton<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, selected: false }
    }

    pub fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }
}

impl<'a> Widget for SlowButton<'a> {
    fn ui(self, ui: &mut Ui) -> Response {
        let font = egui::FontId::proportional(14.0);
        let galley = ui.painter().layout_no_wrap(self.text.to_string(), font.clone(), SlowColors::BLACK);
        let padding = egui::vec2(12.0, 4.0);
        let desired_size = egui::vec2(
            galley.size().x + padding.x * 2.0,
            ui.spacing().interact_size.y.max(galley.size().y + padding.y * 2.0),
        );
        let (rect, response) = ui.allocate_exact_size(desired_size, egui::Sense::click());

        if ui.is_rect_visible(rect) {
            let painter = ui.painter();
            painter.rect_filled(rect, 0.0, SlowColors::WHITE);
            painter.rect_stroke(rect, 0.0, egui::Stroke::new(1.0, SlowColors::BLACK));

            let pressed = response.is_pointer_button_down_on() || self.selected;
            if pressed {
                draw_dither_selection(painter, rect);
            } else if response.hovered() {
                draw_dither_hover(painter, rect);
            }

            painter.text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                self.text,
                font,
                if pressed { SlowColors::WHITE } else { SlowColors::BLACK },
            );
        }

        response
    }
}

pub fn toolbar_separator(ui: &mut Ui) {
    let height = ui.spacing().interact_size.y;
    let (rect, _) = ui.allocate_exact_size(egui::vec2(8.0, height), egui::Sense::hover());
    if ui.is_rect_visible(rect) {
        ui.painter().vline(rect.center().x, rect.y_range(), egui::Stroke::new(1.0, SlowColors::BLACK));
    }
}

/// Status bar: white bg, 1px black border
pub fn status_bar(ui: &mut Ui, text: &str) {
    egui::Frame::none()
        .fill(SlowColors::WHITE)
        .stroke(egui::Stroke::new(1.0, SlowColors::BLACK))
        .inner_margin(egui::Margin::symmetric(8.0, 2.0))
        .show(ui, |ui| {
            ui.label(text);
        });
}

/// Row in the upload browser.
pub struct FileListItem<'a> {
    name: &'a str,
    is_directory: bool,
    selected: bool,
}

impl<'a> FileListItem<'a> {
    pub fn new(name: &'a str, is_directory: bool) -> Self {
        Self { name, is_directory, selected: false }
    }

    pub fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }
}

impl<'a> Widget for FileListItem<'a> {
    fn ui(self, ui: &mut Ui) -> Response {
        let height = 20.0;
        let (rect, response) =
            ui.allocate_exact_size(egui::vec2(ui.available_width(), height), egui::Sense::click());

        if ui.is_rect_visible(rect) {
            let painter = ui.painter();
            painter.rect_filled(rect, 0.0, SlowColors::WHITE);

            let text_color = if self.selected {
                draw_dither_selection(painter, rect);
                SlowColors::WHITE
            } else {
                if response.hovered() {
                    draw_dither_hover(painter, rect);
                }
                SlowColors::BLACK
            };

            let label = if self.is_directory {
                format!("{}/", self.name)
            } else {
                self.name.to_string()
            };
            painter.text(
                egui::pos2(rect.min.x + 6.0, rect.center().y),
                egui::Align2::LEFT_CENTER,
                label,
                egui::FontId::proportional(12.0),
                text_color,
            );
        }

        response
    }
}
