//! Report structure, independent of how it is painted.
//!
//! A [`ReportLayout`] is the ordered list of blocks the painter turns into pages. Column
//! widths are percentages of the usable page width.

use crate::services::reports::normalize::{EventRow, NormalizedKey, NormalizedReport};

/// Usable width of a landscape A4 page with 30 pt side margins, in points.
const USABLE_WIDTH_PT: f64 = 841.89 - 60.0;

pub const SUMMARY_TITLE: &str = "RELATÓRIO DE CONSULTA PIX - RESUMIDO";
pub const DETAILED_TITLE: &str = "RELATÓRIO DE CONSULTA PIX - DETALHADO";

pub const DISCLAIMERS: [&str; 4] = [
    "• Este relatório contém informações sigilosas obtidas através de consulta ao Sistema PIX \
     do Banco Central do Brasil.",
    "• O uso inadequado das informações contidas neste documento pode constituir crime \
     previsto na Lei de Lavagem de Dinheiro.",
    "• Este documento deve ser manuseado apenas por pessoas autorizadas e com necessidade \
     de conhecer as informações.",
    "• A reprodução ou divulgação não autorizada deste relatório é vedada.",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportVariant {
    Summary,
    Detailed,
}

impl ReportVariant {
    /// `"summary"` selects the summary report. Anything else, including nothing, is detailed.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("summary") => ReportVariant::Summary,
            _ => ReportVariant::Detailed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportVariant::Summary => "summary",
            ReportVariant::Detailed => "detailed",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ReportVariant::Summary => SUMMARY_TITLE,
            ReportVariant::Detailed => DETAILED_TITLE,
        }
    }
}

/// Which table a block is; the painter picks colours and font sizes from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    RequestInfo,
    Counts,
    KeyList,
    KeyAttributes,
    EventHistory,
}

impl TableKind {
    /// Label/value tables shade and embolden their first column instead of having a header.
    pub fn is_label_value(&self) -> bool {
        matches!(
            self,
            TableKind::RequestInfo | TableKind::Counts | TableKind::KeyAttributes
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub kind: TableKind,
    pub widths: Vec<f64>,
    pub header: Option<Vec<String>>,
    pub rows: Vec<Vec<String>>,
    /// Alternate the background of body rows.
    pub zebra: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Section(String),
    KeyHeading(String),
    Label(String),
    Table(Table),
    /// Vertical gap in points.
    Spacer(f64),
    PageBreak,
    Note(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportLayout {
    pub variant: ReportVariant,
    pub blocks: Vec<Block>,
}

impl ReportLayout {
    pub fn title(&self) -> &'static str {
        self.variant.title()
    }

    pub fn tables(&self, kind: TableKind) -> impl Iterator<Item = &Table> {
        self.blocks.iter().filter_map(move |b| match b {
            Block::Table(t) if t.kind == kind => Some(t),
            _ => None,
        })
    }
}

fn points(pt: f64) -> f64 {
    pt / USABLE_WIDTH_PT * 100.0
}

fn row<const N: usize>(cells: [&str; N]) -> Vec<String> {
    cells.iter().map(|c| c.to_string()).collect()
}

fn label_value(kind: TableKind, widths_pt: [f64; 2], rows: Vec<Vec<String>>) -> Block {
    Block::Table(Table {
        kind,
        widths: widths_pt.iter().map(|w| points(*w)).collect(),
        header: None,
        rows,
        zebra: false,
    })
}

fn request_info(report: &NormalizedReport, blocks: &mut Vec<Block>) {
    let r = &report.request;
    blocks.push(Block::Section("INFORMAÇÕES DA CONSULTA".to_string()));
    blocks.push(Block::Spacer(6.0));
    blocks.push(label_value(
        TableKind::RequestInfo,
        [150.0, 400.0],
        vec![
            row(["Tipo de Consulta:", &r.lookup_type]),
            row(["Termo Pesquisado:", &r.search_term]),
            row(["Motivo da Consulta:", &r.reason]),
            row(["Responsável:", &r.requester]),
            row(["Data da Consulta:", &r.created_at]),
        ],
    ));
    blocks.push(Block::Spacer(20.0));
}

fn summary_body(report: &NormalizedReport, blocks: &mut Vec<Block>) {
    blocks.push(Block::Section("RESUMO QUANTITATIVO".to_string()));
    blocks.push(Block::Spacer(6.0));
    blocks.push(label_value(
        TableKind::Counts,
        [200.0, 100.0],
        vec![
            row(["Total de Chaves Encontradas:", &report.keys.len().to_string()]),
            row(["Chaves Ativas:", &report.active_keys().to_string()]),
            row(["Chaves Inativas:", &report.inactive_keys().to_string()]),
        ],
    ));
    blocks.push(Block::Spacer(20.0));

    if report.keys.is_empty() {
        return;
    }
    blocks.push(Block::Section("CHAVES PIX ENCONTRADAS".to_string()));
    blocks.push(Block::Spacer(6.0));
    blocks.push(Block::Table(Table {
        kind: TableKind::KeyList,
        widths: vec![25.0, 10.0, 15.0, 25.0, 15.0, 10.0],
        header: Some(row([
            "Chave PIX",
            "Status",
            "CPF/CNPJ",
            "Nome do Proprietário",
            "Instituição Financeira",
            "Data Criação",
        ])),
        rows: report
            .keys
            .iter()
            .map(|k| {
                row([
                    &k.key,
                    &k.status,
                    &k.holder_document,
                    &k.holder_name,
                    &k.institution,
                    &k.account_opened_on,
                ])
            })
            .collect(),
        zebra: true,
    }));
}

fn key_attributes(key: &NormalizedKey) -> Block {
    Block::Table(Table {
        kind: TableKind::KeyAttributes,
        widths: vec![points(150.0), points(400.0)],
        header: None,
        rows: vec![
            row(["Tipo de Chave:", &key.key_type]),
            row(["CPF/CNPJ do Proprietário:", &key.holder_document]),
            row(["Nome do Proprietário:", &key.holder_name]),
            row(["Instituição Financeira:", &key.institution]),
            row(["Agência:", &key.branch]),
            row(["Número da Conta:", &key.account_number]),
            row(["Tipo da Conta:", &key.account_type]),
            row(["Data de Abertura da Conta:", &key.account_opened_on]),
        ],
        zebra: false,
    })
}

fn event_history(events: &[EventRow]) -> Block {
    Block::Table(Table {
        kind: TableKind::EventHistory,
        widths: vec![12.0, 15.0, 15.0, 12.0, 18.0, 18.0, 10.0],
        header: Some(row([
            "Data/Hora",
            "Tipo de Evento",
            "Motivo",
            "CPF/CNPJ",
            "Nome",
            "Instituição",
            "Abertura Conta",
        ])),
        rows: events
            .iter()
            .map(|e| {
                row([
                    &e.occurred_at,
                    &e.event_type,
                    &e.event_reason,
                    &e.holder_document,
                    &e.holder_name,
                    &e.account,
                    &e.account_opened_on,
                ])
            })
            .collect(),
        zebra: true,
    })
}

fn detailed_body(report: &NormalizedReport, blocks: &mut Vec<Block>) {
    if report.keys.is_empty() {
        return;
    }
    blocks.push(Block::Section("DETALHAMENTO DAS CHAVES PIX".to_string()));
    blocks.push(Block::Spacer(10.0));

    let last = report.keys.len() - 1;
    for (i, key) in report.keys.iter().enumerate() {
        blocks.push(Block::KeyHeading(format!(
            "CHAVE {}: {} - Status: {}",
            i + 1,
            key.key,
            key.status
        )));
        blocks.push(Block::Spacer(6.0));
        blocks.push(key_attributes(key));
        blocks.push(Block::Spacer(12.0));

        if !key.events.is_empty() {
            blocks.push(Block::Label("Histórico de Eventos:".to_string()));
            blocks.push(Block::Spacer(6.0));
            blocks.push(event_history(&key.events));
        }

        if i < last {
            blocks.push(Block::Spacer(20.0));
            blocks.push(Block::PageBreak);
        }
    }
}

pub fn build_layout(report: &NormalizedReport, variant: ReportVariant) -> ReportLayout {
    let mut blocks = Vec::new();
    request_info(report, &mut blocks);

    match variant {
        ReportVariant::Summary => summary_body(report, &mut blocks),
        ReportVariant::Detailed => detailed_body(report, &mut blocks),
    }

    blocks.push(Block::Spacer(20.0));
    blocks.push(Block::Section("OBSERVAÇÕES IMPORTANTES".to_string()));
    blocks.push(Block::Spacer(6.0));
    for note in DISCLAIMERS {
        blocks.push(Block::Note(note.to_string()));
        blocks.push(Block::Spacer(4.0));
    }

    ReportLayout { variant, blocks }
}
