use copymove::{CopyMoveAnalyzer, Result, SorterParams};

fn main() -> Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "evidences/copy_move.png".into());

    let analyzer = CopyMoveAnalyzer::new(&path)?.with_params(SorterParams::default())?;
    let report = analyzer.detect()?;

    report.images.from.save("copymove_from.png")?;
    report.images.to.save("copymove_to.png")?;

    let original = image::open(&path)?.to_rgb8();
    report.annotate(&original).save("copymove_annotated.png")?;

    println!("Shift hits found: {}", report.hits.len());
    for hit in report.hits.iter().take(5) {
        println!("  {hit}");
    }
    if report.hits.len() > 5 {
        println!("  ... and {} more", report.hits.len() - 5);
    }

    Ok(())
}
