//! # blob-util 命令行入口
//!
//! 本文件仅负责参数解析、日志初始化与结果输出，
//! 转换逻辑全部委托给库中的 `BlobUtil`。

use std::path::PathBuf;
use std::process::ExitCode;

use blob_util::{BlobError, BlobUtil, CrossOrigin, ImageConfig};
use clap::{Parser, Subcommand};

const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

/// 在 Blob、base64、Data URL 与图片之间转换
#[derive(Parser, Debug)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 将文件输出为 Data URL
    #[command(visible_alias = "e")]
    Encode {
        #[arg(value_hint = clap::ValueHint::FilePath)]
        file: PathBuf,

        /// 媒体类型（省略时按文件签名推断）
        #[arg(short = 't', long = "type")]
        media_type: Option<String>,
    },

    /// 将 Data URL 的载荷写入文件
    #[command(visible_alias = "d")]
    Decode {
        data_url: String,

        #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
        output: PathBuf,
    },

    /// 经绘制表面重新编码图片
    #[command(visible_alias = "c")]
    Convert {
        /// 图片来源：文件路径、http(s) 地址或 Data URL
        src: String,

        /// 导出类型（默认 image/png）
        #[arg(short = 't', long = "type")]
        media_type: Option<String>,

        /// 有损格式质量（0..=1）
        #[arg(short, long)]
        quality: Option<f64>,

        /// 跨域模式（anonymous / use-credentials），空串表示不启用
        #[arg(long)]
        cross_origin: Option<String>,

        /// JSON 配置文件
        #[arg(short = 'C', long, value_hint = clap::ValueHint::FilePath)]
        config: Option<PathBuf>,

        /// 输出文件
        #[arg(short, long, value_hint = clap::ValueHint::FilePath, required_unless_present = "data_url")]
        output: Option<PathBuf>,

        /// 以 Data URL 形式输出到标准输出
        #[arg(long, conflicts_with = "output")]
        data_url: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(BlobError::Image(err)) => {
            log::error!("❌ 图片{}阶段失败：{}（{}）", err.stage(), err, err.code());
            ExitCode::FAILURE
        }
        Err(err) => {
            log::error!("❌ {}（{}）", err, err.code());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), BlobError> {
    match cli.command {
        Commands::Encode { file, media_type } => {
            let util = BlobUtil::new()?;
            let bytes = std::fs::read(&file)?;
            let media_type = media_type
                .or_else(|| infer::get(&bytes).map(|kind| kind.mime_type().to_string()))
                .unwrap_or_else(|| FALLBACK_MEDIA_TYPE.to_string());

            let blob = util.array_buffer_to_blob(bytes, Some(&media_type))?;
            println!("{}", util.blob_to_data_url(&blob).await?);
        }
        Commands::Decode { data_url, output } => {
            let util = BlobUtil::new()?;
            let blob = util.data_url_to_blob(&data_url)?;
            std::fs::write(&output, blob.bytes())?;
            log::info!(
                "💾 已写入 {} - {} bytes（{}）",
                output.display(),
                blob.size(),
                blob.media_type()
            );
        }
        Commands::Convert {
            src,
            media_type,
            quality,
            cross_origin,
            config,
            output,
            data_url,
        } => {
            let util = BlobUtil::with_config(load_config(config)?)?;
            let cross_origin = CrossOrigin::from_attribute(cross_origin.as_deref());

            if data_url {
                let url = util
                    .img_src_to_data_url(&src, media_type.as_deref(), cross_origin, quality)
                    .await?;
                println!("{}", url);
            } else if let Some(output) = output {
                let blob = util
                    .img_src_to_blob(&src, media_type.as_deref(), cross_origin, quality)
                    .await?;
                std::fs::write(&output, blob.bytes())?;
                log::info!(
                    "💾 已写入 {} - {} bytes（{}）",
                    output.display(),
                    blob.size(),
                    blob.media_type()
                );
            }
        }
    }

    Ok(())
}

fn load_config(path: Option<PathBuf>) -> Result<ImageConfig, BlobError> {
    let Some(path) = path else {
        return Ok(ImageConfig::default());
    };

    let json = std::fs::read_to_string(&path)?;
    ImageConfig::from_json_str(&json)
        .map_err(|e| BlobError::Config(format!("{}: {}", path.display(), e)))
}
