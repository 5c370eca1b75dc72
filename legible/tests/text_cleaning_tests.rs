use legible::ocr::RecognitionSpan;
use legible::text::{
    clean_merged, collapse_whitespace, declutter, merge_engine_outputs, normalize, strict_filter,
};
use pretty_assertions::assert_eq;

#[test]
fn paragraph_runs_collapse_to_one_blank_line() {
    assert_eq!(
        collapse_whitespace(&declutter("Hola   mundo\n\n\n\nAdiós")),
        "Hola mundo\n\nAdiós"
    );
}

#[test]
fn declutter_is_idempotent_on_messy_input() {
    let samples = [
        "»» ## Título\n\n\n--- ~~~ ---\nlínea   normal\n12 34\n¿Qué tal?",
        "   \n\n(nota) al margen\n|||||\n\n\nFin",
        "",
    ];
    for sample in samples {
        let once = declutter(sample);
        assert_eq!(declutter(&once), once, "input: {sample:?}");
    }
}

#[test]
fn normalize_folds_ligatures_and_dashes() {
    assert_eq!(normalize("ﬁn del ﬂujo — ok – sí"), "fin del flujo - ok - sí");
}

#[test]
fn strict_filter_drops_numbers_short_lines_and_repeats() {
    let text = "Factura\nFACTURA\nok\n2024 12 31 0099\nTotal a pagar";
    assert_eq!(strict_filter(text), "Factura\nTotal a pagar");
}

#[test]
fn merge_keeps_neural_before_classical() {
    let neural = vec![RecognitionSpan::new("desde la red", 1.0)];
    let classical = vec![
        RecognitionSpan::new("desde tesseract", 0.8),
        RecognitionSpan::new("   ", 0.8),
    ];
    assert_eq!(
        merge_engine_outputs(&neural, &classical),
        "desde la red\ndesde tesseract"
    );
}

#[test]
fn clean_merged_output_is_stable() {
    let merged = "Querida   abuela,\n\n\n%%% $$$\nQuerida abuela,\nte escribo — pronto";
    let cleaned = clean_merged(merged);
    assert_eq!(cleaned, "Querida abuela,\n\nte escribo - pronto");
    assert_eq!(clean_merged(&cleaned), cleaned);
}
