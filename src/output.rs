//! # 输出
//!
//! 把生成的文档连同少量标识标签交给输出协作者。引擎本身从不接触文件系统，
//! 落盘由 `FileSink` 负责，文件名由标签派生。

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::info;

use crate::{cache::Document, engine::Engine, exception::Exception, tls::TlsParameters};

/// 生成文件的标识标签
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTags {
    pub body_id: String,
    pub header_id: String,
    pub jarm: String,
    pub component_type: String,
}

impl OutputTags {
    /// `BH:<body>_JARM:<jarm>_HH:<header>_<type>.conf`
    pub fn file_name(&self) -> String {
        format!(
            "BH:{}_JARM:{}_HH:{}_{}.conf",
            sanitize(&self.body_id),
            sanitize(&self.jarm),
            sanitize(&self.header_id),
            sanitize(&self.component_type)
        )
    }
}

// 标识符中的路径分隔符不能逃出输出目录
fn sanitize(tag: &str) -> String {
    tag.chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            _ => c,
        })
        .collect()
}

#[cfg_attr(test, mockall::automock)]
pub trait DocumentSink {
    fn write(&self, tags: &OutputTags, document: &Document) -> Result<(), Exception>;
}

pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    /// 输出目录不存在时会被创建
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self, Exception> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .map_err(|e| Exception::OutputWriteFailed(format!("{}: {}", dir.display(), e)))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DocumentSink for FileSink {
    fn write(&self, tags: &OutputTags, document: &Document) -> Result<(), Exception> {
        let path = self.dir.join(tags.file_name());
        fs::write(&path, document.as_bytes())
            .map_err(|e| Exception::OutputWriteFailed(format!("{}: {}", path.display(), e)))?;
        info!("Saved: {}", path.display());
        Ok(())
    }
}

/// 生成（或从缓存取出）文档并交给输出协作者，返回使用的标签
pub fn emit(
    engine: &Engine,
    sink: &dyn DocumentSink,
    body_id: &str,
    header_id: &str,
    jarm: &str,
    params: &TlsParameters,
) -> Result<OutputTags, Exception> {
    let document = engine.get_or_generate(body_id, header_id, params)?;
    let component_type = engine
        .component_type_of(body_id)
        .ok_or_else(|| Exception::UnknownBodyId(body_id.to_string()))?;
    let tags = OutputTags {
        body_id: body_id.to_string(),
        header_id: header_id.to_string(),
        jarm: jarm.to_string(),
        component_type,
    };
    sink.write(&tags, &document)?;
    Ok(tags)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> Engine {
        let engine = Engine::new();
        engine
            .register_body("25637482", "error_page", vec!["404".to_string()])
            .unwrap();
        engine
    }

    fn tls() -> TlsParameters {
        TlsParameters::for_domain("example.com").server_tokens(false)
    }

    #[test]
    fn test_file_name() {
        let tags = OutputTags {
            body_id: "25637482".to_string(),
            header_id: "-1002489980".to_string(),
            jarm: "tls".to_string(),
            component_type: "error_page".to_string(),
        };
        assert_eq!(
            tags.file_name(),
            "BH:25637482_JARM:tls_HH:-1002489980_error_page.conf"
        );
    }

    #[test]
    fn test_file_name_sanitized() {
        let tags = OutputTags {
            body_id: "../etc".to_string(),
            header_id: "h".to_string(),
            jarm: "a\\b".to_string(),
            component_type: "t".to_string(),
        };
        let name = tags.file_name();
        assert!(!name.contains('/'));
        assert!(!name.contains('\\'));
    }

    #[test]
    fn test_emit_writes_through_sink() {
        let engine = engine();
        let expected = engine.generate("25637482", "h1", &tls()).unwrap();

        let mut sink = MockDocumentSink::new();
        sink.expect_write()
            .withf(move |tags, document| {
                tags.component_type == "error_page" && tags.jarm == "tls" && *document == expected
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let tags = emit(&engine, &sink, "25637482", "h1", "tls", &tls()).unwrap();
        assert_eq!(tags.body_id, "25637482");
    }

    #[test]
    fn test_emit_does_not_write_on_error() {
        let engine = engine();
        let mut sink = MockDocumentSink::new();
        sink.expect_write().never();

        assert_eq!(
            emit(&engine, &sink, "missing", "h1", "tls", &tls()),
            Err(Exception::UnknownBodyId("missing".to_string()))
        );
    }

    #[test]
    fn test_emit_propagates_sink_failure() {
        let engine = engine();
        let mut sink = MockDocumentSink::new();
        sink.expect_write()
            .returning(|_, _| Err(Exception::OutputWriteFailed("disk full".to_string())));

        assert_eq!(
            emit(&engine, &sink, "25637482", "h1", "tls", &tls()),
            Err(Exception::OutputWriteFailed("disk full".to_string()))
        );
    }
}
