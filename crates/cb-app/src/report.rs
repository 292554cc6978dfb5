use anyhow::Result;

use cb_core::Session;

pub fn print_overview(session: &Session, name: &str) {
    let range = session.zoom_range();
    let (width, height) = session.transform().size();
    println!("Dataset:     {}", name);
    println!(
        "Points:      {} loaded, {} shown, {} on screen",
        session.dataset().points.len(),
        session.shown_points().len(),
        session.pixel_points().len()
    );
    println!("Viewport:    {}x{} px", width, height);
    println!("Zoom range:  x {:.3} .. {:.3}, y {:.3} .. {:.3}", range.min_x, range.max_x, range.min_y, range.max_y);
    println!("Selected:    {}", session.selection().len());
    println!("Marked:      {}", session.marked().count());
}

pub fn print_legend(session: &Session) {
    let Some(legend) = session.legend() else {
        println!("\nNo legend");
        return;
    };
    let acronyms = session.dataset().acronyms.as_ref();

    println!("\n{} (sorted by {})", legend.title(), legend.sort.as_str());
    for (i, class) in legend.classes.iter().enumerate() {
        let expansion = acronyms
            .and_then(|a| a.get(&class.label))
            .map(|full| format!("  ({})", full))
            .unwrap_or_default();
        println!("{:>4}  {}  {:>8}  {}{}", i, class.color, class.count, class.label, expansion);
    }
}

/// Mean expression bin of every gene, as a bar of up to ten marks
pub fn print_gene_bar(session: &Session) {
    let genes = session.gene_intensities();
    if genes.is_empty() {
        return;
    }
    let scope = if session.selection().is_empty() { "shown points" } else { "selection" };
    println!("\nGenes (over {})", scope);
    for gene in genes {
        let value = gene.value.map(|v| format!("  {:.3}", v)).unwrap_or_default();
        println!("  {:<16} {:<10} {}{}", gene.symbol, "#".repeat(gene.bin + 1), gene.bin, value);
    }
}

pub fn print_selection(session: &Session) {
    println!("\nSelection");
    for summary in session.selection_summary() {
        println!("  {}", summary.field);
        for value in summary.values.iter().take(10) {
            println!("    {:<24} {:>8}  {:>5.1}%", value.value, value.count, value.fraction * 100.0);
        }
        if summary.values.len() > 10 {
            println!("    ... {} more", summary.values.len() - 10);
        }
    }
}

pub fn print_labels(session: &Session) -> Result<()> {
    let labels = session.cluster_labels(None)?;
    println!("\nLabels");
    for label in labels {
        println!("  {:<24} ({}, {})", label.label, label.pixel.0, label.pixel.1);
    }
    Ok(())
}

pub fn print_ids(session: &Session) {
    for id in session.export_ids() {
        println!("{}", id);
    }
}
