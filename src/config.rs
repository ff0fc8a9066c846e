use serde_derive::Deserialize;
use serde_derive::Serialize;

use log::{info, warn};
use std::fs;

use crate::{
    assembler::ServerSettings,
    engine::Engine,
    exception::Exception,
    header::HeaderMapping,
    param::DEFAULT_OUTPUT_DIR,
    tls::TlsParameters,
};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HeaderSetEntry {
    pub id: String,
    pub block: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BodyEntry {
    pub id: String,
    pub component: String,
    #[serde(default)]
    pub params: Vec<String>,
}

/// 一次生成任务。`header` 与 `headers` 二选一：前者是直接给出的标识符，
/// 后者是原始响应头，会先归一化再使用。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub body: String,
    #[serde(default)]
    pub header: Option<String>,
    #[serde(default)]
    pub headers: Option<HeaderMapping>,
    #[serde(default = "default_jarm")]
    pub jarm: String,
    #[serde(default)]
    pub tls: TlsParameters,
}

impl Job {
    /// 确定该任务使用的响应头标识符。原始响应头会被注册到引擎的响应头表中。
    pub fn header_id(&self, engine: &Engine) -> Result<String, Exception> {
        match (&self.header, &self.headers) {
            (Some(id), None) => Ok(id.clone()),
            (None, Some(mapping)) => Ok(engine.register_header_mapping(mapping).to_string()),
            (Some(_), Some(_)) => Err(Exception::ConfigInvalid(format!(
                "job for body {} sets both header and headers",
                self.body
            ))),
            (None, None) => Err(Exception::ConfigInvalid(format!(
                "job for body {} sets neither header nor headers",
                self.body
            ))),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    #[serde(default = "default_output_dir")]
    output_dir: String,
    #[serde(default)]
    worker_threads: usize,
    #[serde(default)]
    server: ServerSettings,
    /// 自定义骨架模板文件路径
    #[serde(default)]
    skeleton: Option<String>,
    #[serde(default)]
    global_headers: Vec<String>,
    #[serde(default)]
    header_sets: Vec<HeaderSetEntry>,
    #[serde(default)]
    header_mappings: Vec<HeaderMapping>,
    #[serde(default)]
    bodies: Vec<BodyEntry>,
    #[serde(default)]
    jobs: Vec<Job>,
}

fn default_output_dir() -> String {
    DEFAULT_OUTPUT_DIR.to_string()
}

fn default_jarm() -> String {
    "tls".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            output_dir: default_output_dir(),
            worker_threads: num_cpus::get(),
            server: ServerSettings::default(),
            skeleton: None,
            global_headers: Vec::new(),
            header_sets: Vec::new(),
            header_mappings: Vec::new(),
            bodies: Vec::new(),
            jobs: Vec::new(),
        }
    }

    pub fn from_toml(filename: &str) -> Result<Self, Exception> {
        let str_val = fs::read_to_string(filename)
            .map_err(|e| Exception::ConfigUnreadable(format!("{}: {}", filename, e)))?;
        Self::from_toml_str(&str_val)
    }

    pub fn from_toml_str(str_val: &str) -> Result<Self, Exception> {
        let mut raw_config: Config =
            toml::from_str(str_val).map_err(|e| Exception::ConfigInvalid(e.to_string()))?;
        if raw_config.worker_threads == 0 {
            raw_config.worker_threads = num_cpus::get();
        }
        if raw_config.output_dir.trim().is_empty() {
            warn!("output_dir被设置为空，将使用默认目录{}", DEFAULT_OUTPUT_DIR);
            raw_config.output_dir = default_output_dir();
        }
        Ok(raw_config)
    }

    /// 把配置中的全部注册项应用到引擎上
    pub fn apply(&self, engine: &Engine) -> Result<(), Exception> {
        engine.set_server_settings(self.server.clone());
        if let Some(path) = &self.skeleton {
            let text = fs::read_to_string(path)
                .map_err(|e| Exception::ConfigUnreadable(format!("{}: {}", path, e)))?;
            engine.set_skeleton(&text)?;
        }
        for block in &self.global_headers {
            engine.add_global_headers(block);
        }
        for set in &self.header_sets {
            engine.register_header_set(&set.id, &set.block);
        }
        for mapping in &self.header_mappings {
            let key = engine.register_header_mapping(mapping);
            info!("原始响应头已注册为{}", key);
        }
        for body in &self.bodies {
            engine.register_body(&body.id, &body.component, body.params.clone())?;
        }
        info!(
            "配置已应用：{}个响应头集合，{}个body，{}个任务",
            self.header_sets.len() + self.header_mappings.len(),
            self.bodies.len(),
            self.jobs.len()
        );
        Ok(())
    }
}

impl Config {
    pub fn output_dir(&self) -> &str {
        &self.output_dir
    }

    pub fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    pub fn server(&self) -> &ServerSettings {
        &self.server
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }
}
