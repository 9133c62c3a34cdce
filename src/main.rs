use clap::Parser;
use core_types::{ComponentRef, RequestContext};
use csp::{CspConfig, CspPartialResponseWriter, CspStateHandle};
use markup::{MarkupWriter, PartialResponseWriter, WriteResult, XmlPartialResponseWriter};
use mimalloc::MiMalloc;
use std::error::Error;
use std::fs;
use std::path::PathBuf;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Render a sample partial response through the CSP rewriter.
#[derive(Parser, Debug)]
#[command(name = "csp-render")]
struct Args {
    /// TOML file with rewriter settings.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Nonce for script elements; overrides the config file.
    #[arg(long)]
    nonce: Option<String>,
}

fn load_config(args: &Args) -> Result<CspConfig, Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .map_err(|err| format!("failed to read {}: {err}", path.display()))?;
            toml::from_str(&text)?
        }
        None => CspConfig::default(),
    };
    if let Some(nonce) = &args.nonce {
        config.nonce = Some(nonce.clone());
    }
    Ok(config)
}

fn render_form(w: &mut impl MarkupWriter) -> WriteResult {
    let form = ComponentRef::new("form").with_family("Form");
    let save = ComponentRef::new("form:save").with_family("CommandButton");
    let menu = ComponentRef::new("form:menu").with_family("Menu");

    w.start_element("form", Some(&form))?;
    w.write_attribute("id", "form", None)?;
    w.write_attribute("onsubmit", "return validate(this);", None)?;

    w.start_element("input", None)?;
    w.write_attribute("id", "form:name", None)?;
    w.write_attribute("name", "form:name", None)?;
    w.write_attribute("onkeyup", "touched('form:name')", None)?;
    w.end_element("input")?;

    w.start_element("button", Some(&save))?;
    w.write_attribute("id", "form:save", None)?;
    w.write_attribute("onclick", "save(event); return false;", None)?;
    w.write_text("Save", None)?;
    w.end_element("button")?;

    w.start_element("ul", Some(&menu))?;
    w.write_attribute("id", "form:menu", None)?;
    for item in ["Open", "Close"] {
        w.start_element("li", Some(&menu))?;
        w.write_attribute("onclick", &format!("menu.pick('{item}')"), None)?;
        w.write_text(item, None)?;
        w.end_element("li")?;
    }
    w.end_element("ul")?;

    w.start_element("script", None)?;
    w.write_raw("form.ready();")?;
    w.end_element("script")?;

    w.end_element("form")
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();
    let config = load_config(&args)?;

    let request = RequestContext::new();
    request.execute_script("widgets.refresh('form');");

    let mut writer = CspPartialResponseWriter::new(
        XmlPartialResponseWriter::new(String::new()),
        &request,
        CspStateHandle::new(),
        config,
    )?;
    writer.start_document()?;
    writer.start_update("form")?;
    render_form(&mut writer)?;
    writer.end_update()?;
    writer.end_document()?;

    let wire = writer.into_inner().into_inner();
    log::info!("rendered {} bytes", wire.len());
    println!("{wire}");
    Ok(())
}
