use serde::Serialize;

/// Hidden `cats.show(...)` targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EasterEgg {
    Pimpek,
    Mruczek,
    Wszystkie,
}

impl EasterEgg {
    pub const ALL: [EasterEgg; 3] = [EasterEgg::Pimpek, EasterEgg::Mruczek, EasterEgg::Wszystkie];

    /// Case-insensitive token lookup; surrounding quotes are ignored.
    pub fn from_token(raw: &str) -> Option<Self> {
        let token = raw.trim().trim_matches(|c| c == '\'' || c == '"');
        EasterEgg::ALL
            .into_iter()
            .find(|egg| egg.token().eq_ignore_ascii_case(token))
    }

    pub fn token(self) -> &'static str {
        match self {
            EasterEgg::Pimpek => "pimpek",
            EasterEgg::Mruczek => "mruczek",
            EasterEgg::Wszystkie => "wszystkie",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EasterEgg::Pimpek => "Pimpek",
            EasterEgg::Mruczek => "Mruczek",
            EasterEgg::Wszystkie => "Pimpek i Mruczek",
        }
    }

    fn images(self) -> Vec<OverlayImage> {
        let pimpek = OverlayImage::new("/assets/cats/pimpek.jpg", "Pimpek śpi na kodeksie cywilnym");
        let mruczek = OverlayImage::new("/assets/cats/mruczek.jpg", "Mruczek pilnuje akt sprawy");
        match self {
            EasterEgg::Pimpek => vec![pimpek],
            EasterEgg::Mruczek => vec![mruczek],
            EasterEgg::Wszystkie => vec![pimpek, mruczek],
        }
    }

    fn caption(self) -> &'static str {
        match self {
            EasterEgg::Pimpek => "Pimpek, starszy specjalista ds. drzemek procesowych.",
            EasterEgg::Mruczek => "Mruczek, aplikant kociej kancelarii.",
            EasterEgg::Wszystkie => "Cały zespół kancelarii w komplecie.",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OverlayImage {
    pub src: String,
    pub alt: String,
}

impl OverlayImage {
    fn new(src: &str, alt: &str) -> Self {
        Self {
            src: src.to_string(),
            alt: alt.to_string(),
        }
    }
}

/// Modal shown for an easter egg. Dismissed by the backdrop or escape.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Overlay {
    pub egg: EasterEgg,
    pub caption: String,
    pub images: Vec<OverlayImage>,
}

impl Overlay {
    pub fn for_egg(egg: EasterEgg) -> Self {
        Self {
            egg,
            caption: egg.caption().to_string(),
            images: egg.images(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn tokens_are_case_and_quote_insensitive() {
        assert_eq!(EasterEgg::from_token("'Pimpek'"), Some(EasterEgg::Pimpek));
        assert_eq!(EasterEgg::from_token("\"MRUCZEK\""), Some(EasterEgg::Mruczek));
        assert_eq!(EasterEgg::from_token("wszystkie"), Some(EasterEgg::Wszystkie));
        assert_eq!(EasterEgg::from_token("burek"), None);
    }

    #[test]
    fn combined_egg_shows_both_cats() {
        let overlay = Overlay::for_egg(EasterEgg::Wszystkie);
        assert_eq!(overlay.images.len(), 2);
        assert_eq!(Overlay::for_egg(EasterEgg::Pimpek).images.len(), 1);
    }
}
