use anyhow::{anyhow, Context};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_FUNCTION: &str = "generate-ai-content";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Opaque text generation backend. Output is returned to callers verbatim.
pub trait TextGenerator {
    fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}

/// Calls a hosted edge function that proxies the language model.
///
/// `POST {base_url}/functions/v1/{function}` with `{"prompt": ...}`; a success
/// body is the generated text, a failure body is `{"error": "..."}`.
pub struct EdgeFunctionClient {
    http: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
}

impl EdgeFunctionClient {
    pub fn new(base_url: &str, api_key: &str, function: &str) -> anyhow::Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("maestrod/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            endpoint: format!(
                "{}/functions/v1/{}",
                base_url.trim_end_matches('/'),
                function
            ),
            api_key: api_key.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[derive(Deserialize)]
struct FunctionError {
    error: String,
}

impl TextGenerator for EdgeFunctionClient {
    fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        debug!(endpoint = %self.endpoint, prompt_len = prompt.len(), "invoking AI function");
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header("apikey", &self.api_key)
            .json(&json!({ "prompt": prompt }))
            .send()
            .context("AI request failed")?;

        let status = response.status();
        let body = response.text().context("failed to read AI response")?;
        if !status.is_success() {
            let message = serde_json::from_str::<FunctionError>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            warn!(status = status.as_u16(), %message, "AI function returned an error");
            return Err(anyhow!("AI function error ({}): {}", status.as_u16(), message));
        }
        Ok(body)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum EvaluationToolKind {
    #[serde(rename = "Rubric", alias = "rubric")]
    Rubric,
    #[serde(rename = "Community Project Outline", alias = "communityProjectOutline")]
    CommunityProjectOutline,
}

impl EvaluationToolKind {
    fn label_es(self) -> &'static str {
        match self {
            Self::Rubric => "Rúbrica",
            Self::CommunityProjectOutline => "Esquema de Proyecto Comunitario",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum SchoolLevel {
    #[serde(rename = "Primary School", alias = "primary")]
    PrimarySchool,
    #[serde(rename = "Middle School", alias = "middle")]
    MiddleSchool,
    #[serde(rename = "High School", alias = "high")]
    HighSchool,
}

impl SchoolLevel {
    fn label_es(self) -> &'static str {
        match self {
            Self::PrimarySchool => "Primaria",
            Self::MiddleSchool => "Secundaria",
            Self::HighSchool => "Bachillerato",
        }
    }
}

/// Prompt for an evaluation instrument aligned with the Nueva Escuela Mexicana.
pub fn evaluation_tool_prompt(kind: EvaluationToolKind, topic: &str, level: SchoolLevel) -> String {
    format!(
        "Crea una detallada \"{}\" para un proyecto sobre \"{}\" para un nivel de \"{}\", \
         alineada con los principios de la Nueva Escuela Mexicana (NEM). La herramienta debe \
         ser práctica, fácil de entender para los docentes, y promover el compromiso comunitario \
         y el pensamiento crítico. El resultado debe ser en español. Formatea la salida en Markdown.",
        kind.label_es(),
        topic.trim(),
        level.label_es()
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EmailPurpose {
    PositiveUpdate,
    GradeConcern,
    BehavioralIssue,
}

impl EmailPurpose {
    fn label_es(self) -> &'static str {
        match self {
            Self::PositiveUpdate => "Actualización Positiva",
            Self::GradeConcern => "Preocupación por Calificaciones",
            Self::BehavioralIssue => "Asunto de Conducta",
        }
    }
}

/// What the parent email draft gets to know about the student.
#[derive(Debug, Clone)]
pub struct ParentEmailContext<'a> {
    pub student_name: &'a str,
    pub class_name: &'a str,
    pub professor: &'a str,
    pub average: f64,
    pub absences: usize,
    pub conduct_points: i64,
    pub purpose: EmailPurpose,
    pub note: &'a str,
}

pub fn parent_email_prompt(ctx: &ParentEmailContext<'_>) -> String {
    let average = if ctx.average > 0.0 {
        format!("{:.1}", ctx.average)
    } else {
        "sin calificaciones registradas".to_string()
    };
    let mut prompt = format!(
        "Redacta un correo electrónico cordial y profesional para el padre, madre o tutor de \
         \"{}\", estudiante de la clase \"{}\". Propósito del correo: {}.\n\
         Datos del estudiante: promedio actual {}, faltas {}, puntos de conducta {}.\n",
        ctx.student_name,
        ctx.class_name,
        ctx.purpose.label_es(),
        average,
        ctx.absences,
        ctx.conduct_points
    );
    let note = ctx.note.trim();
    if !note.is_empty() {
        prompt.push_str(&format!("Nota del docente: {note}\n"));
    }
    if !ctx.professor.trim().is_empty() {
        prompt.push_str(&format!("Firma como: {}\n", ctx.professor.trim()));
    }
    prompt.push_str(
        "Incluye un asunto, mantén un tono respetuoso y propone un siguiente paso concreto. \
         El resultado debe ser en español.",
    );
    prompt
}

#[cfg(test)]
pub mod testing {
    use super::TextGenerator;
    use std::cell::RefCell;

    /// Records prompts and answers with a canned reply or failure.
    pub struct FakeGenerator {
        pub reply: Result<String, String>,
        pub prompts: RefCell<Vec<String>>,
    }

    impl FakeGenerator {
        pub fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                prompts: RefCell::new(Vec::new()),
            }
        }

        pub fn failing(message: &str) -> Self {
            Self {
                reply: Err(message.to_string()),
                prompts: RefCell::new(Vec::new()),
            }
        }
    }

    impl TextGenerator for FakeGenerator {
        fn generate(&self, prompt: &str) -> anyhow::Result<String> {
            self.prompts.borrow_mut().push(prompt.to_string());
            self.reply.clone().map_err(|m| anyhow::anyhow!(m))
        }
    }
}
