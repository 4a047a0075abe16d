use std::path::Path;

use mamdani::legacy::{read_fis, DEFAULT_STEPS};
use mamdani::{codegen, Context, DefuzzificationOp, Inputs};

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Debug,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data/tipper.fis");
    let fis = read_fis(&path, DEFAULT_STEPS)?;

    println!("rules:\n{fis}\n");

    let rows: Vec<Vec<f64>> = (0..=10)
        .step_by(2)
        .flat_map(|service| (0..=10).step_by(5).map(move |food| vec![service as f64, food as f64]))
        .collect();
    let tips = fis.batch_predict(rows.clone())?;

    for (row, tip) in rows.iter().zip(&tips) {
        println!("service = {:>4}, food = {:>4} -> tip = {tip:.3}", row[0], row[1]);
    }

    let inputs = Inputs::new().with("service", 7.5).with("food", 4.);
    for method in [
        DefuzzificationOp::Centroid,
        DefuzzificationOp::Bisector,
        DefuzzificationOp::Mom,
        DefuzzificationOp::Som,
        DefuzzificationOp::Lom,
    ] {
        let ctx = Context::default().with_defuzzification(method);
        println!("{method:>9}: {:.3}", fis.get_crisp_output_in(&inputs, &ctx)?);
    }

    println!("\n{}", fis.to_json()?);
    println!("\n{}", codegen::to_c(&fis, "tipper")?);

    Ok(())
}
