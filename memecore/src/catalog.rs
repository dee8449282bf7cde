//! Built-in meme templates

use crate::source::ImageSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    pub id: &'static str,
    pub url: &'static str,
    pub name: &'static str,
}

impl Template {
    pub fn source(&self) -> ImageSource {
        ImageSource::url(self.url)
    }
}

pub const TEMPLATES: &[Template] = &[
    Template { id: "drake", url: "https://i.imgflip.com/30b1gx.jpg", name: "Drake Hotline Bling" },
    Template { id: "distracted", url: "https://i.imgflip.com/1ur9b0.jpg", name: "Distracted Boyfriend" },
    Template { id: "doge", url: "https://i.imgflip.com/4t0m5.jpg", name: "Doge" },
    Template { id: "buttons", url: "https://i.imgflip.com/1g8my4.jpg", name: "Two Buttons" },
    Template { id: "expanding-brain", url: "https://i.imgflip.com/1jwhww.jpg", name: "Expanding Brain" },
    Template { id: "gru", url: "https://i.imgflip.com/1bhw.jpg", name: "Gru Plan" },
    Template { id: "pikachu", url: "https://i.imgflip.com/2kbn1e.jpg", name: "Surprised Pikachu" },
];

/// The template a fresh composition starts on.
pub fn default_template() -> &'static Template {
    &TEMPLATES[0]
}

pub fn find(id: &str) -> Option<&'static Template> {
    TEMPLATES.iter().find(|t| t.id == id)
}
