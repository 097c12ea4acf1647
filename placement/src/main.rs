use common::*;
use placement::{render, CompositionParams, CompositionRequest};

fn main() {
    // parse config and args first
    let params = match CompositionParams::load_file_with_args("placement.txt") {
        Ok(params) => params,
        Err(err) => {
            eprintln!("bad arguments: {}", err);
            std::process::exit(2);
        }
    };

    let _logging = logging::LoggerBuilder::with_env()
        .and_then(|builder| builder.init())
        .expect("logging failed");
    info!("initialized logging"; "level" => ?_logging.level());
    debug!("config: {:#?}", params);

    let exit = match run(&params) {
        Ok(()) => 0,
        Err(err) => {
            error!("composition failed"; "error" => %err);
            1
        }
    };

    // let logging end gracefully
    drop(_logging);
    std::thread::sleep(std::time::Duration::from_millis(100));

    std::process::exit(exit);
}

fn run(params: &CompositionParams) -> BoxedResult<()> {
    let palette_path = params
        .palette_file
        .as_ref()
        .ok_or("no palette file provided, pass --palette-file")?;
    let palette: Vec<placement::PaletteRecord> =
        serde_json::from_str(&std::fs::read_to_string(palette_path)?)?;

    let request = CompositionRequest {
        style: Some(params.style),
        surrounding: Some(params.surrounding),
        plant_palette: palette,
    };

    info!("composing"; "seed" => params.seed(), "style" => ?params.style);
    let response = placement::generate(request, params)?;

    std::fs::write(&params.output, serde_json::to_string_pretty(&response)?)?;
    info!("wrote response"; "path" => %params.output.display());

    if params.render {
        for composition in &response.data {
            let image = render::render_composition(composition, params.render_scale);
            let path = params
                .output
                .with_extension(format!("{}.png", composition.data_value));
            render::save(&image, path)?;
        }
    }

    Ok(())
}
