// ==========================================
// 电商运营后台 - 格式适配器实现
// ==========================================
// 职责: 原始字节 → 表头 + 行字典
// 支持: CSV / 电子表格 (.xlsx) / JSON (对象数组) / XML (<item> 条目)
// 约束: 整个文件一次性读入内存，不做流式处理
// ==========================================

use crate::domain::import::{BatchImportConfig, FormatOptions, ParsedData};
use crate::domain::types::FileType;
use crate::domain::value::{CellValue, RawRow};
use crate::importer::error::{ImportError, ImportOutcome};
use crate::importer::import_traits::FormatAdapter;
use calamine::{Data, Reader, Xlsx};
use csv::ReaderBuilder;
use quick_xml::events::Event;
use serde_json::Value as JsonValue;
use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use tracing::{debug, warn};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
}

/// 二维网格 → ParsedData（CSV 与电子表格共用）
///
/// # 规则
/// - 全空白行跳过
/// - has_header=true: 首个非空行作为表头（去除首尾空白，空表头按列序号命名）
/// - has_header=false: 按首行宽度合成列名 "1", "2", ...（1-based）
/// - 行宽与表头不一致仅记录警告：短行缺失字段，长行多余列丢弃
pub(crate) fn rows_from_grid(grid: Vec<Vec<CellValue>>, has_header: bool) -> ParsedData {
    let mut lines = grid
        .into_iter()
        .filter(|cells| !cells.iter().all(CellValue::is_blank))
        .peekable();

    let headers: Vec<String> = if has_header {
        match lines.next() {
            Some(cells) => cells
                .iter()
                .enumerate()
                .map(|(idx, cell)| {
                    let name = cell.to_string().trim().to_string();
                    if name.is_empty() {
                        (idx + 1).to_string()
                    } else {
                        name
                    }
                })
                .collect(),
            None => return ParsedData::new(Vec::new(), Vec::new()),
        }
    } else {
        match lines.peek() {
            Some(first) => (1..=first.len()).map(|i| i.to_string()).collect(),
            None => return ParsedData::new(Vec::new(), Vec::new()),
        }
    };

    let mut rows = Vec::new();
    for (idx, cells) in lines.enumerate() {
        if cells.len() != headers.len() {
            warn!(
                row_number = idx + 1,
                expected = headers.len(),
                actual = cells.len(),
                "行字段数与表头不一致"
            );
        }

        let row: RawRow = headers.iter().cloned().zip(cells).collect();
        rows.push(row);
    }

    ParsedData::new(headers, rows)
}

// ==========================================
// CSV Adapter 实现
// ==========================================
pub struct CsvAdapter;

impl FormatAdapter for CsvAdapter {
    fn file_type(&self) -> FileType {
        FileType::Csv
    }

    fn parse(
        &self,
        bytes: &[u8],
        has_header: bool,
        options: &FormatOptions,
    ) -> ImportOutcome<ParsedData> {
        if !options.delimiter.is_ascii() {
            return Err(ImportError::InvalidConfig(format!(
                "CSV 分隔符必须是单个 ASCII 字符: {:?}",
                options.delimiter
            )));
        }

        // 表头由 rows_from_grid 统一处理
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true) // 允许行长度不一致
            .delimiter(options.delimiter as u8)
            .from_reader(strip_bom(bytes));

        // 按字节读取: 非 UTF-8 行（如 Latin-1 导出）按替换字符解码，仍进入校验
        let mut grid = Vec::new();
        for (line_idx, result) in reader.byte_records().enumerate() {
            match result {
                Ok(record) => {
                    if std::str::from_utf8(record.as_slice()).is_err() {
                        warn!(line = line_idx + 1, "CSV 行含非 UTF-8 字节，已替换");
                    }
                    grid.push(
                        record
                            .iter()
                            .map(|field| CellValue::Text(String::from_utf8_lossy(field).into_owned()))
                            .collect::<Vec<_>>(),
                    );
                }
                Err(e) => {
                    // 畸形行不阻断解析
                    warn!(line = line_idx + 1, error = %e, "CSV 行解析失败，已跳过");
                }
            }
        }

        Ok(rows_from_grid(grid, has_header))
    }
}

// ==========================================
// Spreadsheet Adapter 实现
// ==========================================
pub struct SpreadsheetAdapter;

/// Excel 单元格 → CellValue（整数值浮点收敛为整数）
fn cell_to_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Null,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => CellValue::Integer(*f as i64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Error(_) => CellValue::Null,
        other => CellValue::Text(other.to_string()),
    }
}

impl FormatAdapter for SpreadsheetAdapter {
    fn file_type(&self) -> FileType {
        FileType::Spreadsheet
    }

    fn parse(
        &self,
        bytes: &[u8],
        has_header: bool,
        options: &FormatOptions,
    ) -> ImportOutcome<ParsedData> {
        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes.to_vec()))?;

        // 指定工作表，缺省取第一个
        let sheet_names = workbook.sheet_names();
        let sheet_name = match &options.sheet_name {
            Some(name) if sheet_names.iter().any(|s| s == name) => name.clone(),
            Some(name) => {
                return Err(ImportError::SpreadsheetParseError(format!(
                    "工作表不存在: {}",
                    name
                )))
            }
            None => sheet_names.first().cloned().ok_or_else(|| {
                ImportError::SpreadsheetParseError("电子表格无工作表".to_string())
            })?,
        };
        debug!(sheet = %sheet_name, "读取工作表");

        let range = workbook.worksheet_range(&sheet_name)?;
        let grid: Vec<Vec<CellValue>> = range
            .rows()
            .map(|row| row.iter().map(cell_to_value).collect())
            .collect();

        Ok(rows_from_grid(grid, has_header))
    }
}

// ==========================================
// JSON Adapter 实现
// ==========================================
pub struct JsonAdapter;

impl FormatAdapter for JsonAdapter {
    fn file_type(&self) -> FileType {
        FileType::Json
    }

    fn parse(
        &self,
        bytes: &[u8],
        _has_header: bool,
        _options: &FormatOptions,
    ) -> ImportOutcome<ParsedData> {
        let value: JsonValue = serde_json::from_slice(strip_bom(bytes))?;

        let JsonValue::Array(items) = value else {
            return Err(ImportError::JsonParseError(
                "顶层必须是对象数组".to_string(),
            ));
        };

        let mut headers = Vec::new();
        let mut seen = HashSet::new();
        let mut rows = Vec::with_capacity(items.len());

        for (idx, item) in items.into_iter().enumerate() {
            let JsonValue::Object(object) = item else {
                return Err(ImportError::JsonParseError(format!(
                    "第 {} 个元素不是对象",
                    idx + 1
                )));
            };

            let mut row = HashMap::with_capacity(object.len());
            for (key, value) in object {
                if seen.insert(key.clone()) {
                    headers.push(key.clone());
                }
                row.insert(key, CellValue::from(value));
            }
            rows.push(row);
        }

        Ok(ParsedData::new(headers, rows))
    }
}

// ==========================================
// XML Adapter 实现
// ==========================================
// 仅支持扁平结构: <item><sku>A1</sku><name>Widget</name></item>
// 嵌套子元素 → 显式解析错误；无子元素的条目（纯属性）→ 跳过并告警
pub struct XmlAdapter;

impl FormatAdapter for XmlAdapter {
    fn file_type(&self) -> FileType {
        FileType::Xml
    }

    fn parse(
        &self,
        bytes: &[u8],
        _has_header: bool,
        options: &FormatOptions,
    ) -> ImportOutcome<ParsedData> {
        let item_tag = options.xml_item_tag.as_bytes().to_vec();
        let mut reader = quick_xml::Reader::from_reader(strip_bom(bytes));
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        let mut headers = Vec::new();
        let mut seen = HashSet::new();
        let mut rows = Vec::new();

        let mut in_item = false;
        let mut depth = 0usize;
        let mut item_count = 0usize;
        let mut current_field: Option<String> = None;
        let mut current_text = String::new();
        let mut row: RawRow = HashMap::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => {
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                    if !in_item {
                        if e.local_name().as_ref() == item_tag.as_slice() {
                            in_item = true;
                            depth = 0;
                            item_count += 1;
                            row = HashMap::new();
                        }
                    } else if depth == 0 {
                        depth = 1;
                        current_field = Some(name);
                        current_text.clear();
                    } else {
                        return Err(ImportError::XmlParseError(format!(
                            "第 {} 个 <{}> 含嵌套元素 <{}>，仅支持扁平子元素",
                            item_count, options.xml_item_tag, name
                        )));
                    }
                }
                Event::Empty(e) => {
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                    if !in_item {
                        if e.local_name().as_ref() == item_tag.as_slice() {
                            item_count += 1;
                            warn!(item = item_count, "跳过无子元素的条目");
                        }
                    } else if depth == 0 {
                        if seen.insert(name.clone()) {
                            headers.push(name.clone());
                        }
                        row.insert(name, CellValue::Null);
                    } else {
                        return Err(ImportError::XmlParseError(format!(
                            "第 {} 个 <{}> 含嵌套元素 <{}>，仅支持扁平子元素",
                            item_count, options.xml_item_tag, name
                        )));
                    }
                }
                Event::Text(t) => {
                    if in_item && depth == 1 {
                        let text = t
                            .unescape()
                            .map_err(|e| ImportError::XmlParseError(e.to_string()))?;
                        current_text.push_str(&text);
                    }
                }
                Event::CData(c) => {
                    if in_item && depth == 1 {
                        current_text.push_str(&String::from_utf8_lossy(&c));
                    }
                }
                Event::End(_) => {
                    if !in_item {
                        // 条目外的容器结束标签
                    } else if depth == 1 {
                        depth = 0;
                        if let Some(field) = current_field.take() {
                            let value = if current_text.is_empty() {
                                CellValue::Null
                            } else {
                                CellValue::Text(std::mem::take(&mut current_text))
                            };
                            if seen.insert(field.clone()) {
                                headers.push(field.clone());
                            }
                            row.insert(field, value);
                        }
                    } else {
                        in_item = false;
                        if row.is_empty() {
                            warn!(item = item_count, "跳过无子元素的条目");
                        } else {
                            rows.push(std::mem::take(&mut row));
                        }
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        if in_item {
            return Err(ImportError::XmlParseError(format!(
                "文件在第 {} 个 <{}> 内提前结束",
                item_count, options.xml_item_tag
            )));
        }

        Ok(ParsedData::new(headers, rows))
    }
}

// ==========================================
// FormatRegistry - 适配器注册表
// ==========================================
// 新增格式只需注册适配器，不影响执行器
pub struct FormatRegistry {
    adapters: HashMap<FileType, Box<dyn FormatAdapter>>,
}

impl Default for FormatRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(CsvAdapter));
        registry.register(Box::new(SpreadsheetAdapter));
        registry.register(Box::new(JsonAdapter));
        registry.register(Box::new(XmlAdapter));
        registry
    }
}

impl FormatRegistry {
    pub fn empty() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    /// 注册适配器（同类型覆盖）
    pub fn register(&mut self, adapter: Box<dyn FormatAdapter>) {
        self.adapters.insert(adapter.file_type(), adapter);
    }

    pub fn get(&self, file_type: FileType) -> ImportOutcome<&dyn FormatAdapter> {
        self.adapters
            .get(&file_type)
            .map(|a| a.as_ref())
            .ok_or_else(|| ImportError::UnsupportedFormat(file_type.to_string()))
    }

    /// 校验声明类型与内容一致后解析
    pub fn parse(&self, bytes: &[u8], config: &BatchImportConfig) -> ImportOutcome<ParsedData> {
        let adapter = self.get(config.file_type)?;
        ensure_content_matches(config.file_type, bytes)?;
        adapter.parse(bytes, config.has_header, &config.options)
    }
}

/// 声明类型与内容嗅探结果比对（空文件不判定）
fn ensure_content_matches(declared: FileType, bytes: &[u8]) -> ImportOutcome<()> {
    if strip_bom(bytes).iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(());
    }

    let detected = FileType::sniff(bytes);
    if detected == declared {
        return Ok(());
    }

    Err(ImportError::FormatMismatch {
        declared: declared.to_string(),
        detected: detected.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> FormatOptions {
        FormatOptions::default()
    }

    fn text(v: &str) -> CellValue {
        CellValue::text(v)
    }

    #[test]
    fn test_csv_adapter_valid_file() {
        let bytes = b" sku , name ,price\nA1,Widget,9.99\nB2,Gadget,5\n";
        let parsed = CsvAdapter.parse(bytes, true, &options()).unwrap();

        assert_eq!(parsed.headers, vec!["sku", "name", "price"]);
        assert_eq!(parsed.total_rows, 2);
        assert_eq!(parsed.rows[0].get("sku"), Some(&text("A1")));
        assert_eq!(parsed.rows[1].get("price"), Some(&text("5")));
    }

    #[test]
    fn test_csv_adapter_skip_blank_lines() {
        let bytes = b"sku,name\nA1,Widget\n\n,\nB2,Gadget\n";
        let parsed = CsvAdapter.parse(bytes, true, &options()).unwrap();

        // 应跳过空行
        assert_eq!(parsed.total_rows, 2);
    }

    #[test]
    fn test_csv_adapter_custom_delimiter() {
        let bytes = b"sku;name\nA1;Widget\n";
        let opts = FormatOptions {
            delimiter: ';',
            ..Default::default()
        };
        let parsed = CsvAdapter.parse(bytes, true, &opts).unwrap();

        assert_eq!(parsed.rows[0].get("name"), Some(&text("Widget")));
    }

    #[test]
    fn test_csv_adapter_short_and_long_rows() {
        let bytes = b"sku,name,price\nA1,Widget\nB2,Gadget,5,extra\n";
        let parsed = CsvAdapter.parse(bytes, true, &options()).unwrap();

        assert_eq!(parsed.rows[0].len(), 2);
        assert!(parsed.rows[0].get("price").is_none());
        assert_eq!(parsed.rows[1].len(), 3);
    }

    #[test]
    fn test_csv_adapter_headers_match_row_keys() {
        let bytes = b"a,b,c\n1,2,3\n4,5,6\n7,8,9\n";
        let parsed = CsvAdapter.parse(bytes, true, &options()).unwrap();

        for row in &parsed.rows {
            assert_eq!(row.len(), parsed.headers.len());
        }
    }

    #[test]
    fn test_csv_adapter_without_header() {
        let bytes = b"A1,Widget\nB2,Gadget\n";
        let parsed = CsvAdapter.parse(bytes, false, &options()).unwrap();

        assert_eq!(parsed.headers, vec!["1", "2"]);
        assert_eq!(parsed.total_rows, 2);
        assert_eq!(parsed.rows[0].get("1"), Some(&text("A1")));
    }

    #[test]
    fn test_csv_adapter_strips_bom() {
        let bytes = b"\xEF\xBB\xBFsku,name\nA1,Widget\n";
        let parsed = CsvAdapter.parse(bytes, true, &options()).unwrap();

        assert_eq!(parsed.headers[0], "sku");
    }

    #[test]
    fn test_rows_from_grid_without_header_uses_first_row_shape() {
        let grid = vec![
            vec![text("A1"), text("Widget"), CellValue::Integer(3)],
            vec![text("B2"), text("Gadget")],
        ];
        let parsed = rows_from_grid(grid, false);

        assert_eq!(parsed.headers, vec!["1", "2", "3"]);
        assert_eq!(parsed.rows[0].get("3"), Some(&CellValue::Integer(3)));
        assert!(parsed.rows[1].get("3").is_none());
    }

    #[test]
    fn test_rows_from_grid_empty() {
        let parsed = rows_from_grid(Vec::new(), true);
        assert!(parsed.headers.is_empty());
        assert_eq!(parsed.total_rows, 0);
    }

    #[test]
    fn test_cell_to_value() {
        assert_eq!(cell_to_value(&Data::Float(1001.0)), CellValue::Integer(1001));
        assert_eq!(cell_to_value(&Data::Float(9.5)), CellValue::Number(9.5));
        assert_eq!(cell_to_value(&Data::Empty), CellValue::Null);
        assert_eq!(cell_to_value(&Data::String("x".into())), text("x"));
    }

    // 两个工作表: Products（sku,name,price,stock_quantity，2 行）, Archive（sku,name，1 行）
    const CATALOG_XLSX: &[u8] = include_bytes!("../../tests/fixtures/catalog.xlsx");

    #[test]
    fn test_spreadsheet_adapter_defaults_to_first_sheet() {
        let parsed = SpreadsheetAdapter.parse(CATALOG_XLSX, true, &options()).unwrap();

        assert_eq!(parsed.headers, vec!["sku", "name", "price", "stock_quantity"]);
        assert_eq!(parsed.total_rows, 2);
        assert_eq!(parsed.rows[0].get("sku"), Some(&text("A100")));
        assert_eq!(parsed.rows[0].get("price"), Some(&CellValue::Number(9.5)));
        assert_eq!(parsed.rows[0].get("stock_quantity"), Some(&CellValue::Integer(10)));
        // 整数值浮点收敛为整数
        assert_eq!(parsed.rows[1].get("price"), Some(&CellValue::Integer(20)));
    }

    #[test]
    fn test_spreadsheet_adapter_selects_sheet_by_name() {
        let opts = FormatOptions {
            sheet_name: Some("Archive".to_string()),
            ..Default::default()
        };
        let parsed = SpreadsheetAdapter.parse(CATALOG_XLSX, true, &opts).unwrap();

        assert_eq!(parsed.headers, vec!["sku", "name"]);
        assert_eq!(parsed.total_rows, 1);
        assert_eq!(parsed.rows[0].get("name"), Some(&text("Retired Lamp")));
    }

    #[test]
    fn test_spreadsheet_adapter_unknown_sheet() {
        let opts = FormatOptions {
            sheet_name: Some("Missing".to_string()),
            ..Default::default()
        };
        let err = SpreadsheetAdapter.parse(CATALOG_XLSX, true, &opts).unwrap_err();

        assert!(matches!(err, ImportError::SpreadsheetParseError(_)));
        assert!(err.to_string().contains("Missing"));
    }

    #[test]
    fn test_spreadsheet_adapter_without_header() {
        let parsed = SpreadsheetAdapter.parse(CATALOG_XLSX, false, &options()).unwrap();

        assert_eq!(parsed.headers, vec!["1", "2", "3", "4"]);
        assert_eq!(parsed.total_rows, 3);
        assert_eq!(parsed.rows[0].get("1"), Some(&text("sku")));
    }

    #[test]
    fn test_registry_accepts_workbook_bytes() {
        let config = BatchImportConfig::new(FileType::Spreadsheet);
        let parsed = FormatRegistry::default().parse(CATALOG_XLSX, &config).unwrap();
        assert_eq!(parsed.total_rows, 2);
    }

    #[test]
    fn test_csv_adapter_keeps_non_utf8_rows() {
        let bytes = b"sku,name\nA100,Caf\xe9 Noir\nB200,Widget\n";
        let parsed = CsvAdapter.parse(bytes, true, &options()).unwrap();

        assert_eq!(parsed.total_rows, 2);
        assert_eq!(parsed.rows[0].get("sku"), Some(&text("A100")));
        assert_eq!(parsed.rows[0].get("name"), Some(&text("Caf\u{FFFD} Noir")));
        assert_eq!(parsed.rows[1].get("name"), Some(&text("Widget")));
    }

    #[test]
    fn test_spreadsheet_adapter_rejects_garbage() {
        let result = SpreadsheetAdapter.parse(b"PK\x03\x04not really a zip", true, &options());
        assert!(result.unwrap_err().is_format_error());
    }

    #[test]
    fn test_json_adapter_array_of_objects() {
        let bytes = br#"[{"sku": "A1", "price": 9.99}, {"sku": "B2", "stock": 4, "tags": ["x"]}]"#;
        let parsed = JsonAdapter.parse(bytes, true, &options()).unwrap();

        assert_eq!(parsed.total_rows, 2);
        assert_eq!(parsed.headers.len(), 4);
        assert_eq!(parsed.rows[0].get("price"), Some(&CellValue::Number(9.99)));
        assert_eq!(parsed.rows[1].get("stock"), Some(&CellValue::Integer(4)));
        assert_eq!(parsed.rows[1].get("tags"), Some(&text("[\"x\"]")));
    }

    #[test]
    fn test_json_adapter_rejects_non_array() {
        let err = JsonAdapter
            .parse(br#"{"items": []}"#, true, &options())
            .unwrap_err();
        assert!(matches!(err, ImportError::JsonParseError(_)));
    }

    #[test]
    fn test_json_adapter_rejects_non_object_element() {
        let err = JsonAdapter.parse(br#"[{"a": 1}, 2]"#, true, &options()).unwrap_err();
        assert!(err.to_string().contains("第 2 个元素"));
    }

    #[test]
    fn test_xml_adapter_flat_items() {
        let bytes = br#"<?xml version="1.0"?>
            <catalog>
              <item><sku>A1</sku><name>Widget &amp; Co</name><price>9.99</price></item>
              <item><sku>B2</sku><name><![CDATA[Gadget]]></name><price/></item>
            </catalog>"#;
        let parsed = XmlAdapter.parse(bytes, true, &options()).unwrap();

        assert_eq!(parsed.total_rows, 2);
        assert_eq!(parsed.headers, vec!["sku", "name", "price"]);
        assert_eq!(parsed.rows[0].get("name"), Some(&text("Widget & Co")));
        assert_eq!(parsed.rows[1].get("name"), Some(&text("Gadget")));
        assert_eq!(parsed.rows[1].get("price"), Some(&CellValue::Null));
    }

    #[test]
    fn test_xml_adapter_rejects_nested_children() {
        let bytes = b"<items><item><sku>A1</sku><dims><w>1</w></dims></item></items>";
        let err = XmlAdapter.parse(bytes, true, &options()).unwrap_err();
        assert!(matches!(err, ImportError::XmlParseError(_)));
    }

    #[test]
    fn test_xml_adapter_attribute_only_items_yield_empty_result() {
        let bytes = br#"<items><item sku="A1"/><item sku="B2"></item></items>"#;
        let parsed = XmlAdapter.parse(bytes, true, &options()).unwrap();
        assert_eq!(parsed.total_rows, 0);
    }

    #[test]
    fn test_xml_adapter_custom_item_tag() {
        let bytes = b"<feed><product><sku>A1</sku></product></feed>";
        let opts = FormatOptions {
            xml_item_tag: "product".to_string(),
            ..Default::default()
        };
        let parsed = XmlAdapter.parse(bytes, true, &opts).unwrap();
        assert_eq!(parsed.rows[0].get("sku"), Some(&text("A1")));
    }

    #[test]
    fn test_xml_adapter_malformed() {
        let result = XmlAdapter.parse(b"<items><item><sku>A1</name></item></items>", true, &options());
        assert!(result.is_err());
    }

    #[test]
    fn test_registry_format_mismatch() {
        let registry = FormatRegistry::default();
        let config = BatchImportConfig::new(FileType::Json);

        let err = registry.parse(b"sku,name\nA1,Widget", &config).unwrap_err();
        assert!(matches!(err, ImportError::FormatMismatch { .. }));
        assert!(err.is_format_error());
    }

    #[test]
    fn test_registry_unsupported_format() {
        let registry = FormatRegistry::empty();
        let config = BatchImportConfig::new(FileType::Csv);

        let err = registry.parse(b"a\n1", &config).unwrap_err();
        assert!(matches!(err, ImportError::UnsupportedFormat(_)));
    }
}
