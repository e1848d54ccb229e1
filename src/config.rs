use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::clients::openrouter::DEFAULT_BASE_URL;
use crate::error::{IdeatorError, Result};
use crate::pipeline::{Amplifier2Source, StageGraph, StageKind, StageSpec, Topology};

pub const API_KEY_VAR: &str = "OPENROUTER_API_KEY";
pub const DEFAULT_MODEL: &str = "openrouter/google/gemini-2.5-flash-lite";
pub const DEFAULT_NUM_IDEAS: u32 = 15;
pub const DEFAULT_CONFIG_PATH: &str = "ideator.toml";
/// Value shipped in `.env.example`; treated as "not configured" by `--check`
pub const PLACEHOLDER_API_KEY: &str = "your_api_key_here";

/// Per-stage model override variables
const STAGE_MODEL_VARS: [(StageKind, &str); 6] = [
    (StageKind::Generation, "IDEATOR_GENERATOR_MODEL"),
    (StageKind::Amplification1, "IDEATOR_AMPLIFIER_1_MODEL"),
    (StageKind::Amplification2, "IDEATOR_AMPLIFIER_2_MODEL"),
    (StageKind::Evaluation, "IDEATOR_EVALUATOR_MODEL"),
    (StageKind::Categorization, "IDEATOR_CATEGORIZER_MODEL"),
    (StageKind::Synthesis, "IDEATOR_SYNTHESIZER_MODEL"),
];

/// Optional on-disk configuration (ideator.toml). Every field may be omitted.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct FileConfig {
    pub llm: LlmSection,
    pub generation: GenerationSection,
    pub pipeline: PipelineSection,
    pub output: OutputSection,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LlmSection {
    pub model: Option<String>,
    pub base_url: Option<String>,
    /// Applies to every stage when set
    pub temperature: Option<f32>,
    pub request_timeout_secs: Option<u64>,
    /// Keyed by stage kind (`generation`, `amplification_1`, ...) or stage name
    pub stage_models: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GenerationSection {
    pub num_ideas: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineSection {
    pub topology: Option<Topology>,
    pub amplifier_2_sees: Option<Amplifier2Source>,
    /// Explicit stage list; replaces the named topology when non-empty
    pub stages: Vec<StageDecl>,
}

/// A stage declared by hand in the config file
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StageDecl {
    pub name: String,
    pub kind: StageKind,
    #[serde(default)]
    pub context: Vec<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputSection {
    pub dir: Option<PathBuf>,
}

/// Fully resolved, immutable run configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub stage_models: HashMap<StageKind, String>,
    /// Overrides every stage's persona temperature when set
    pub temperature: Option<f32>,
    pub num_ideas: u32,
    pub topology: Topology,
    pub amplifier_2_sees: Amplifier2Source,
    pub custom_stages: Vec<StageDecl>,
    pub output_dir: PathBuf,
    pub request_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            stage_models: HashMap::new(),
            temperature: None,
            num_ideas: DEFAULT_NUM_IDEAS,
            topology: Topology::default(),
            amplifier_2_sees: Amplifier2Source::default(),
            custom_stages: Vec::new(),
            output_dir: PathBuf::from("output"),
            request_timeout_secs: None,
        }
    }
}

impl Config {
    /// Load from `.env`, the TOML file and the process environment.
    ///
    /// Env file lookup: IDEATOR_ENV_FILE if set, otherwise ./.env. The TOML
    /// path is `config_path`, else IDEATOR_CONFIG, else ideator.toml; a missing
    /// default file is fine, a missing explicit file is not.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        if let Ok(env_path) = std::env::var("IDEATOR_ENV_FILE") {
            let _ = dotenvy::from_path(env_path);
        } else {
            let _ = dotenvy::from_path(".env");
        }

        let explicit = config_path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var("IDEATOR_CONFIG").ok().map(PathBuf::from));
        let path = explicit
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

        let toml_text = match std::fs::read_to_string(&path) {
            Ok(content) => Some(content),
            Err(_) if explicit.is_none() => {
                tracing::debug!("Config file {} not found, using defaults", path.display());
                None
            }
            Err(e) => {
                return Err(IdeatorError::config(format!(
                    "cannot read config file {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let env: HashMap<String, String> = std::env::vars().collect();
        Self::from_sources(toml_text.as_deref(), &env)
    }

    /// Pure resolution: defaults, then TOML, then environment
    pub fn from_sources(toml_text: Option<&str>, env: &HashMap<String, String>) -> Result<Self> {
        let file: FileConfig = match toml_text {
            Some(text) => toml::from_str(text)?,
            None => FileConfig::default(),
        };

        let mut config = Config::default();
        config.apply_file(file)?;
        config.apply_env(env)?;
        config.validate()?;
        Ok(config)
    }

    fn apply_file(&mut self, file: FileConfig) -> Result<()> {
        if let Some(model) = file.llm.model {
            self.model = model;
        }
        if let Some(url) = file.llm.base_url {
            self.base_url = url;
        }
        if let Some(t) = file.llm.temperature {
            self.temperature = Some(t);
        }
        if let Some(secs) = file.llm.request_timeout_secs {
            self.request_timeout_secs = Some(secs);
        }
        for (key, model) in file.llm.stage_models {
            let kind: StageKind = key.parse()?;
            self.stage_models.insert(kind, model);
        }
        if let Some(n) = file.generation.num_ideas {
            self.num_ideas = n;
        }
        if let Some(topology) = file.pipeline.topology {
            self.topology = topology;
        }
        if let Some(sees) = file.pipeline.amplifier_2_sees {
            self.amplifier_2_sees = sees;
        }
        self.custom_stages = file.pipeline.stages;
        if let Some(dir) = file.output.dir {
            self.output_dir = dir;
        }
        Ok(())
    }

    fn apply_env(&mut self, env: &HashMap<String, String>) -> Result<()> {
        let get = |key: &str| {
            env.get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        self.api_key = get(API_KEY_VAR);
        if let Some(url) = get("OPENROUTER_BASE_URL") {
            self.base_url = url;
        }
        if let Some(model) = get("IDEATOR_MODEL") {
            self.model = model;
        }
        for (kind, var) in STAGE_MODEL_VARS {
            if let Some(model) = get(var) {
                tracing::debug!("{} env override applied", var);
                self.stage_models.insert(kind, model);
            }
        }
        if let Some(raw) = get("TEMPERATURE") {
            let t = raw.parse::<f32>().map_err(|_| {
                IdeatorError::config(format!("TEMPERATURE must be a number, got '{}'", raw))
            })?;
            self.temperature = Some(t);
        }
        if let Some(raw) = get("NUM_IDEAS") {
            self.num_ideas = raw.parse::<u32>().map_err(|_| {
                IdeatorError::config(format!("NUM_IDEAS must be a positive integer, got '{}'", raw))
            })?;
        }
        if let Some(raw) = get("IDEATOR_TOPOLOGY") {
            self.topology = raw.parse()?;
        }
        if let Some(raw) = get("IDEATOR_AMPLIFIER_2_SEES") {
            self.amplifier_2_sees = raw.parse()?;
        }
        if let Some(dir) = get("IDEATOR_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.num_ideas == 0 {
            return Err(IdeatorError::config("NUM_IDEAS must be at least 1"));
        }
        let temperatures = self
            .temperature
            .into_iter()
            .chain(self.custom_stages.iter().filter_map(|s| s.temperature));
        for t in temperatures {
            if !(0.0..=2.0).contains(&t) {
                return Err(IdeatorError::config(format!(
                    "temperature must be between 0.0 and 2.0, got {}",
                    t
                )));
            }
        }
        if self.model.trim().is_empty() {
            return Err(IdeatorError::config("model name must not be empty"));
        }
        Ok(())
    }

    /// The credential, or a configuration error when it is absent
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            IdeatorError::config(format!("{} not found in environment variables", API_KEY_VAR))
        })
    }

    pub fn model_for(&self, kind: StageKind) -> &str {
        self.stage_models
            .get(&kind)
            .map(String::as_str)
            .unwrap_or(&self.model)
    }

    pub fn temperature_for(&self, kind: StageKind) -> f32 {
        self.temperature.unwrap_or_else(|| kind.default_temperature())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Placeholder values substituted into stage templates
    pub fn template_vars(&self) -> HashMap<String, String> {
        HashMap::from([("num_ideas".to_string(), self.num_ideas.to_string())])
    }

    /// Resolve the stage graph: an explicit stage list wins over the topology
    pub fn stage_graph(&self) -> Result<StageGraph> {
        if self.custom_stages.is_empty() {
            return StageGraph::from_topology(self.topology, self.amplifier_2_sees, |kind| {
                (self.model_for(kind).to_string(), self.temperature_for(kind))
            });
        }

        let stages = self
            .custom_stages
            .iter()
            .map(|decl| StageSpec {
                name: decl.name.clone(),
                kind: decl.kind,
                context: decl.context.clone(),
                model: decl
                    .model
                    .clone()
                    .unwrap_or_else(|| self.model_for(decl.kind).to_string()),
                temperature: decl
                    .temperature
                    .unwrap_or_else(|| self.temperature_for(decl.kind)),
            })
            .collect();
        StageGraph::new(stages)
    }
}
