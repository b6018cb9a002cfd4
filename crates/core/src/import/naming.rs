use super::types::ImportError;
use crate::config::ImportConfig;
use crate::quality::MediaType;
use chrono::NaiveDate;

/// Values substituted into naming templates.
#[derive(Debug, Clone, Default)]
pub struct NamingTokens {
    pub title: String,
    pub year: Option<i32>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub air_date: Option<NaiveDate>,
    pub quality: String,
}

/// Renders destination paths from the configured naming templates.
///
/// Supported tokens: `{title}`, `{year}`, `{season:02}`, `{episode:02}`,
/// `{air_date}`, `{quality}`.
#[derive(Debug, Clone)]
pub struct NamingTemplates {
    movie: String,
    tv: String,
    daily: String,
}

impl NamingTemplates {
    pub fn from_config(config: &ImportConfig) -> Self {
        Self {
            movie: config.movie_template.clone(),
            tv: config.tv_template.clone(),
            daily: config.daily_template.clone(),
        }
    }

    /// Renders the relative destination path (without extension).
    pub fn render(
        &self,
        media_type: MediaType,
        tokens: &NamingTokens,
    ) -> Result<String, ImportError> {
        let template = match media_type {
            MediaType::Movie => &self.movie,
            // Daily shows are identified by air date instead of episode numbers.
            MediaType::Tv | MediaType::Anime => {
                if tokens.episode.is_none() && tokens.air_date.is_some() {
                    &self.daily
                } else {
                    &self.tv
                }
            }
        };

        let mut out = template.clone();
        out = out.replace("{title}", &sanitize(&tokens.title));
        out = replace_required(out, "{year}", tokens.year.map(|y| y.to_string()))?;
        out = replace_required(
            out,
            "{season:02}",
            tokens.season.map(|s| format!("{s:02}")),
        )?;
        out = replace_required(
            out,
            "{episode:02}",
            tokens.episode.map(|e| format!("{e:02}")),
        )?;
        out = replace_required(
            out,
            "{air_date}",
            tokens.air_date.map(|d| d.format("%Y-%m-%d").to_string()),
        )?;
        out = out.replace("{quality}", &sanitize(&tokens.quality));
        Ok(out)
    }
}

fn replace_required(
    template: String,
    token: &str,
    value: Option<String>,
) -> Result<String, ImportError> {
    if !template.contains(token) {
        return Ok(template);
    }
    match value {
        Some(v) => Ok(template.replace(token, &v)),
        None => Err(ImportError::Template(format!(
            "template needs {token} but the release provides no value"
        ))),
    }
}

/// Strips characters that are unsafe in file names.
fn sanitize(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|'))
        .collect::<String>()
        .trim()
        .to_string()
}
