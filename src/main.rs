// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # vhostgen 命令行入口
//!
//! 读取 TOML 配置，注册组件、响应头集合与 body，然后在 Tokio 线程池上执行全部生成任务，
//! 并把结果写入输出目录。单个任务失败只会记录日志，不影响其它任务。

use std::{process, sync::Arc, time::Instant};

use log::{debug, error, info};
use tokio::runtime::Builder;

use vhostgen::{output::emit, Config, Engine, FileSink};

const DEFAULT_CONFIG: &str = "config/development.toml";
const LOG_CONFIG: &str = "config/log4rs.yaml";

fn main() {
    // 1. 初始化日志系统：通过外部 YAML 配置级别与输出目的地
    if let Err(e) = log4rs::init_file(LOG_CONFIG, Default::default()) {
        eprintln!("无法初始化日志系统（{}）：{}", LOG_CONFIG, e);
    }

    // 2. 配置加载：第一个命令行参数可以指定配置文件
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let config = match Config::from_toml(&config_path) {
        Ok(c) => c,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };
    info!("配置文件已载入：{}", config_path);

    // 3. 引擎初始化并应用注册项
    let engine = Arc::new(Engine::new());
    if let Err(e) = config.apply(&engine) {
        error!("应用配置失败：{}", e);
        process::exit(1);
    }

    let sink = match FileSink::new(config.output_dir()) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };
    info!("输出目录：{}", sink.dir().display());

    // 4. 异步运行时定制：根据配置文件分配工作线程数
    let runtime = match Builder::new_multi_thread()
        .worker_threads(config.worker_threads())
        .enable_all()
        .build()
    {
        Ok(r) => r,
        Err(e) => {
            error!("无法创建Tokio运行时：{}", e);
            process::exit(1);
        }
    };

    let start_time = Instant::now();
    let jobs = config.jobs().to_vec();
    let total = jobs.len();

    // 5. 每个任务都是纯计算加一次写文件，放到阻塞线程池上执行
    let failed = runtime.block_on(async move {
        let mut handles = Vec::with_capacity(total);
        for (id, job) in jobs.into_iter().enumerate() {
            let engine = Arc::clone(&engine);
            let sink = Arc::clone(&sink);
            handles.push(tokio::task::spawn_blocking(move || {
                let result = job.header_id(&engine).and_then(|header_id| {
                    debug!("[ID{}]开始生成：body={}, header={}", id, job.body, header_id);
                    emit(&engine, sink.as_ref(), &job.body, &header_id, &job.jarm, &job.tls)
                });
                if let Err(e) = &result {
                    error!("[ID{}]无法为body {}生成配置：{}", id, job.body, e);
                }
                result.is_ok()
            }));
        }

        let mut failed = 0usize;
        for handle in handles {
            match handle.await {
                Ok(true) => {}
                Ok(false) => failed += 1,
                Err(e) => {
                    error!("生成任务异常退出：{}", e);
                    failed += 1;
                }
            }
        }
        failed
    });

    info!(
        "生成完成：{}个任务，{}个失败，用时{}ms",
        total,
        failed,
        start_time.elapsed().as_millis()
    );
    if failed > 0 {
        process::exit(2);
    }
}
