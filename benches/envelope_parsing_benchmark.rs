//! Page parsing throughput: full 15-row partial responses, with and without
//! surrounding noise, plus analysis-response repair.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use impi_search::infrastructure::parsing::{ContextualParser, PageContext, PageParser};
use impi_search::repair_analysis;

fn row(index: usize) -> String {
    format!(
        r##"<tr data-ri="{index}" class="ui-widget-content ui-datatable-even"><td>{n}</td><td>NOMINATIVA</td><td></td><td>TITULAR {index} S.A. DE C.V.</td><td><a href="#">{case}</a></td><td>{reg}</td><td>LUNA {index}</td><td>30</td><td><img src="logo.png"/></td></tr>"##,
        n = index + 1,
        case = 2_000_000 + index,
        reg = 1_500_000 + index,
    )
}

fn partial_response(rows: usize, padding: usize) -> String {
    let body: String = (0..rows).map(row).collect();
    format!(
        r#"<?xml version='1.0' encoding='UTF-8'?><partial-response id="j_id1"><changes><update id="frmBsqFonetica"><![CDATA[<form id="frmBsqFonetica">{pad}<div id="frmBsqFonetica:resultadoExpediente"><table><tbody id="frmBsqFonetica:resultadoExpediente_data" class="ui-datatable-data ui-widget-content">{body}</tbody></table></div></form>]]></update><update id="j_id1:javax.faces.ViewState:0"><![CDATA[-123:456]]></update></changes></partial-response>"#,
        pad = "<div class=\"ui-messages\">aviso</div>".repeat(padding),
    )
}

fn page_parsing(c: &mut Criterion) {
    let parser = PageParser::new().unwrap();
    let context = PageContext::new(1);
    let compact = partial_response(15, 0);
    let noisy = partial_response(15, 500);

    c.bench_function("parse 15-row partial response", |b| {
        b.iter(|| parser.parse_with_context(black_box(&compact), &context))
    });

    c.bench_function("parse 15-row partial response with noise", |b| {
        b.iter(|| parser.parse_with_context(black_box(&noisy), &context))
    });
}

fn analysis_repair(c: &mut Criterion) {
    let complete = r#"```json
{"porcentaje_viabilidad": 62, "nivel_riesgo": "MEDIO", "top_15_conflictivas": [{"denominacion": "LUNA", "expediente": "100"}], "analisis_detallado": "Texto", "recomendaciones": ["Uno", "Dos"]}
```"#;
    let truncated = r#"{"porcentaje_viabilidad": 40, "nivel_riesgo": "ALTO", "top_15_conflictivas": [{"denominacion": "LUNA", "expediente": "10"#;

    c.bench_function("repair complete analysis", |b| b.iter(|| repair_analysis(black_box(complete))));
    c.bench_function("repair truncated analysis", |b| b.iter(|| repair_analysis(black_box(truncated))));
}

criterion_group!(benches, page_parsing, analysis_repair);
criterion_main!(benches);
