use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use opsboard::{cli, config, dataset, error, export, logging, pages};
use cli::{Cli, Commands};
use config::Config;
use dataset::{load_records, Dataset};
use opsboard_common::ingest::parse_datetime;
use opsboard_common::{
    format_absolute, format_relative, Announcement, Bill, Client, Folder, Project, Tool,
    ToolCategory,
};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = Config::load().context("設定の読み込みに失敗しました")?;
    let ctx = config.render_context(Utc::now());
    let data_dir = config.data_dir.clone();
    let data_dir = data_dir.as_deref();
    let locale = config.effective_locale();

    match cli.command {
        Commands::Folders { view, path, tree } => {
            let query = view.to_query::<Folder>(&locale)?;
            let folders: Vec<Folder> = load_records(Dataset::Folders, view.input.as_deref(), data_dir)?;
            let selected = path.as_deref().map(pages::parse_path);
            let report = pages::folders(&folders, &query, selected.as_deref(), tree, &ctx);
            export::emit(&report, &view.output)?;
        }

        Commands::Clients { view } => {
            let query = view.to_query::<Client>(&locale)?;
            let clients: Vec<Client> = load_records(Dataset::Clients, view.input.as_deref(), data_dir)?;
            let report = pages::clients(&clients, &query, &ctx);
            export::emit(&report, &view.output)?;
        }

        Commands::Projects { view } => {
            let query = view.to_query::<Project>(&locale)?;
            let projects: Vec<Project> = load_records(Dataset::Projects, view.input.as_deref(), data_dir)?;
            let report = pages::projects(&projects, &query, &ctx);
            export::emit(&report, &view.output)?;
        }

        Commands::Tools { view, categories } => {
            let query = view.to_query::<Tool>(&locale)?;
            let tools: Vec<Tool> = load_records(Dataset::Tools, view.input.as_deref(), data_dir)?;
            let categories: Vec<ToolCategory> =
                load_records(Dataset::ToolCategories, categories.as_deref(), data_dir)?;
            let report = pages::tools(&tools, &categories, &query, &ctx);
            export::emit(&report, &view.output)?;
        }

        Commands::Bills { view, outstanding } => {
            let query = view.to_query::<Bill>(&locale)?;
            let bills: Vec<Bill> = load_records(Dataset::Bills, view.input.as_deref(), data_dir)?;
            let report = pages::bills(&bills, &query, outstanding, &ctx);
            export::emit(&report, &view.output)?;
        }

        Commands::Announcements { view, pinned } => {
            let query = view.to_query::<Announcement>(&locale)?;
            let announcements: Vec<Announcement> =
                load_records(Dataset::Announcements, view.input.as_deref(), data_dir)?;
            let report = pages::announcements(&announcements, &query, pinned, &ctx);
            export::emit(&report, &view.output)?;
        }

        Commands::Ago { timestamp, now } => {
            let parse = |s: &str| {
                parse_datetime(s)
                    .ok_or_else(|| error::OpsboardError::Config(format!("日時を解釈できません: {}", s)))
            };
            let ts = parse(&timestamp)?;
            let now = match now {
                Some(now) => parse(&now)?,
                None => ctx.now,
            };
            println!("{}", format_relative(ts, now));
            println!("{}", format_absolute(ts, ctx.offset, &ctx.date_format));
        }

        Commands::Config { show, set_locale, set_utc_offset, set_data_dir } => {
            let mut config = config;
            let changed = set_locale.is_some() || set_utc_offset.is_some() || set_data_dir.is_some();

            if let Some(locale) = set_locale {
                config.set_locale(&locale)?;
                println!("✔ ロケールを設定しました: {}", config.locale);
            }

            if let Some(minutes) = set_utc_offset {
                config.set_utc_offset(minutes)?;
                println!("✔ UTCオフセットを設定しました: {}分", config.utc_offset_minutes);
            }

            if let Some(dir) = set_data_dir {
                println!("✔ データディレクトリを設定しました: {}", dir.display());
                config.data_dir = Some(dir);
            }

            if changed {
                config.save().context("設定の保存に失敗しました")?;
            }

            if show || !changed {
                let currency = config.render_context(ctx.now).currency;
                println!("設定:");
                println!("  ロケール: {}", config.effective_locale());
                println!("  通貨: {} ({})", currency.code, currency.locale);
                println!("  UTCオフセット: {}分", config.utc_offset_minutes);
                println!("  日付書式: {}", config.date_format);
                println!(
                    "  データディレクトリ: {}",
                    config
                        .data_dir
                        .as_ref()
                        .map(|d| d.display().to_string())
                        .unwrap_or_else(|| "未設定（デモデータ）".to_string())
                );
                println!("  設定ファイル: {}", Config::config_path()?.display());
            }
        }
    }

    Ok(())
}
