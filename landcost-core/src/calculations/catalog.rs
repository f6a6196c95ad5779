//! Lookup table of every indicator row and estimate line the worksheets rely on.
//!
//! Rows are identified by `(category, serial_number)`. The in-memory backend
//! seeds itself from these tables and the SQLite seed files mirror them.

use rust_decimal::Decimal;

use crate::models::{Category, EstimateLine, IndicatorInput, LineKey, LineKind};

use crate::models::Category::{Contingency, Demolition, LandCompensation, Resettlement};
use crate::models::LineKind::{GrandTotal, GroupSubtotal, Item, Subtotal};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorDef {
    pub category: Category,
    pub serial: &'static str,
    pub name: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineDef {
    pub category: Category,
    pub serial: &'static str,
    pub project_name: &'static str,
    pub unit: &'static str,
    pub kind: LineKind,
}

const fn ind(category: Category, serial: &'static str, name: &'static str) -> IndicatorDef {
    IndicatorDef {
        category,
        serial,
        name,
    }
}

const fn line(
    category: Category,
    serial: &'static str,
    project_name: &'static str,
    unit: &'static str,
    kind: LineKind,
) -> LineDef {
    LineDef {
        category,
        serial,
        project_name,
        unit,
        kind,
    }
}

pub const INDICATORS: &[IndicatorDef] = &[
    // 征地补偿
    ind(LandCompensation, "1", "征收土地总面积（亩）"),
    ind(LandCompensation, "1.1", "耕地面积（亩）"),
    ind(LandCompensation, "1.2", "园地面积（亩）"),
    ind(LandCompensation, "1.3", "林地面积（亩）"),
    ind(LandCompensation, "1.4", "其他农用地面积（亩）"),
    ind(LandCompensation, "2", "平均综合补偿标准（万元/亩）"),
    ind(LandCompensation, "2.1", "耕地补偿标准（万元/亩）"),
    ind(LandCompensation, "2.2", "园地补偿标准（万元/亩）"),
    ind(LandCompensation, "2.3", "林地补偿标准（万元/亩）"),
    ind(LandCompensation, "2.4", "其他农用地补偿标准（万元/亩）"),
    ind(LandCompensation, "3", "青苗补偿面积（亩）"),
    ind(LandCompensation, "4", "青苗补偿标准（万元/亩）"),
    ind(LandCompensation, "5", "地上附着物补偿面积（亩）"),
    ind(LandCompensation, "6", "地上附着物补偿标准（万元/亩）"),
    ind(LandCompensation, "7", "耕地开垦面积（亩）"),
    ind(LandCompensation, "8", "耕地开垦费标准（万元/亩）"),
    ind(LandCompensation, "9", "耕地占用税计税面积（亩）"),
    ind(LandCompensation, "10", "耕地占用税税额标准（元/平方米）"),
    // 拆迁补偿
    ind(Demolition, "1", "拆迁总面积（平方米）"),
    ind(Demolition, "1.1", "砖混结构房屋面积（平方米）"),
    ind(Demolition, "1.2", "砖木结构房屋面积（平方米）"),
    ind(Demolition, "1.3", "简易结构房屋面积（平方米）"),
    ind(Demolition, "1.4", "附属设施面积（平方米）"),
    ind(Demolition, "1.5", "构筑物面积（平方米）"),
    ind(Demolition, "2.1", "砖混结构补偿标准（元/平方米）"),
    ind(Demolition, "2.2", "砖木结构补偿标准（元/平方米）"),
    ind(Demolition, "2.3", "简易结构补偿标准（元/平方米）"),
    ind(Demolition, "2.4", "附属设施补偿标准（元/平方米）"),
    ind(Demolition, "2.5", "构筑物补偿标准（元/平方米）"),
    // 人员及企业安置
    ind(Resettlement, "1", "农业户籍人口（人）"),
    ind(Resettlement, "2", "劳动力安置人口（人）"),
    ind(Resettlement, "3", "超转人员人口（人）"),
    ind(Resettlement, "4", "劳动力安置补助标准（万元/人）"),
    ind(Resettlement, "5", "超转人员安置补助标准（万元/人）"),
    ind(Resettlement, "6", "养老保险补贴标准（元/人）"),
    ind(Resettlement, "7", "企业停产停业面积（平方米）"),
    ind(Resettlement, "8", "停产停业损失补偿标准（元/平方米）"),
    ind(Resettlement, "9", "企业搬迁面积（平方米）"),
    ind(Resettlement, "10", "企业搬迁补助标准（元/平方米）"),
    ind(Resettlement, "11", "设备数量（台）"),
    ind(Resettlement, "12", "设备搬迁补助标准（元/台）"),
    ind(Resettlement, "13", "搬迁户数（户）"),
    ind(Resettlement, "14", "搬家补助标准（元/户）"),
    ind(Resettlement, "15", "住宅临时安置面积（平方米）"),
    ind(Resettlement, "16", "住宅临时安置标准（元/平方米）"),
    ind(Resettlement, "17", "非住宅临时安置面积（平方米）"),
    ind(Resettlement, "18", "非住宅临时安置标准（元/平方米）"),
    ind(Resettlement, "19", "安置房建设面积（平方米）"),
    ind(Resettlement, "20", "安置房建设标准（元/平方米）"),
    ind(Resettlement, "21", "货币安置面积（平方米）"),
    ind(Resettlement, "22", "货币安置补偿标准（元/平方米）"),
    // 不可预见费
    ind(Contingency, "1", "不可预见费费率（%）"),
];

pub const LINES: &[LineDef] = &[
    line(LandCompensation, "1", "土地补偿费", "亩", Item),
    line(LandCompensation, "2", "青苗补偿费", "亩", Item),
    line(LandCompensation, "3", "地上附着物补偿费", "亩", Item),
    line(LandCompensation, "4", "耕地开垦费", "亩", Item),
    line(LandCompensation, "5", "耕地占用税", "亩", Item),
    line(LandCompensation, "6", "征地补偿费小计", "万元", Subtotal),
    line(Demolition, "1", "砖混结构房屋补偿费", "平方米", Item),
    line(Demolition, "2", "砖木结构房屋补偿费", "平方米", Item),
    line(Demolition, "3", "简易结构房屋补偿费", "平方米", Item),
    line(Demolition, "4", "附属设施补偿费", "平方米", Item),
    line(Demolition, "5", "构筑物补偿费", "平方米", Item),
    line(Demolition, "6", "拆迁补偿费小计", "万元", Subtotal),
    line(Resettlement, "1", "安置补助费", "万元", GroupSubtotal),
    line(Resettlement, "1.1", "劳动力安置补助费", "人", Item),
    line(Resettlement, "1.2", "超转人员安置补助费", "人", Item),
    line(Resettlement, "1.3", "养老保险补贴", "人", Item),
    line(Resettlement, "2", "企业停产停业损失补偿费", "平方米", Item),
    line(Resettlement, "3", "企业搬迁补助费", "平方米", Item),
    line(Resettlement, "4", "设备搬迁费", "台", Item),
    line(Resettlement, "5", "搬家补助费", "户", Item),
    line(Resettlement, "6", "临时安置周转费", "万元", GroupSubtotal),
    line(Resettlement, "6.1", "住宅临时安置费", "平方米", Item),
    line(Resettlement, "6.2", "非住宅临时安置费", "平方米", Item),
    line(Resettlement, "7", "住房拆迁安置费", "万元", GroupSubtotal),
    line(Resettlement, "7.1", "安置房建设费", "平方米", Item),
    line(Resettlement, "7.2", "货币安置补偿费", "平方米", Item),
    line(Resettlement, "8", "人员及企业安置补偿费小计", "万元", Subtotal),
    line(Contingency, "1", "不可预见费", "%", Subtotal),
    line(Contingency, "2", "总费用", "万元", GrandTotal),
];

/// The line carrying a category's subtotal.
pub fn subtotal_line(category: Category) -> LineKey {
    let serial = match category {
        LandCompensation | Demolition => "6",
        Resettlement => "8",
        Contingency => "1",
    };
    LineKey::new(category, serial)
}

pub fn grand_total_line() -> LineKey {
    LineKey::new(Contingency, "2")
}

/// Catalog indicators as zero-valued rows with sequential ids.
pub fn indicator_rows() -> Vec<IndicatorInput> {
    INDICATORS
        .iter()
        .zip(1..)
        .map(|(def, id)| IndicatorInput {
            id,
            category: def.category,
            serial_number: def.serial.to_string(),
            indicator_name: def.name.to_string(),
            value: Decimal::ZERO,
            remark: None,
            basis: None,
            source_url: None,
        })
        .collect()
}

/// Catalog estimate lines as zero-valued rows with sequential ids.
pub fn estimate_rows() -> Vec<EstimateLine> {
    LINES
        .iter()
        .zip(1..)
        .map(|(def, id)| EstimateLine {
            id,
            category: def.category,
            serial_number: def.serial.to_string(),
            project_name: def.project_name.to_string(),
            unit: def.unit.to_string(),
            kind: def.kind,
            value: Decimal::ZERO,
            unit_price: Decimal::ZERO,
            cost: Decimal::ZERO,
        })
        .collect()
}
