use crate::errors::{NotifierError, Result};
use log::debug;

/// 每条记录占用的物理行数（表头 + 5 行）
pub const BLOCK_LEN: usize = 6;

/// 能够判断自身是否为记录起始行的表格行
pub trait BlockMarker {
    fn is_block_start(&self) -> bool;
}

/// 行在记录块中的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowRole {
    Header,
    First,
    Second,
    Third,
    /// 页面上的隐藏行，不读取
    Hidden,
    Fifth,
}

impl RowRole {
    /// 块内各行的角色，按偏移顺序
    pub const SEQUENCE: [RowRole; BLOCK_LEN] = [
        RowRole::Header,
        RowRole::First,
        RowRole::Second,
        RowRole::Third,
        RowRole::Hidden,
        RowRole::Fifth,
    ];
}

/// 一条记录对应的行，隐藏行已剔除
#[derive(Debug)]
pub struct RowBlock<'a, R> {
    /// 起始行在过滤后行序列中的下标
    pub start: usize,
    pub header: &'a R,
    pub first: &'a R,
    pub second: &'a R,
    pub third: &'a R,
    pub fifth: &'a R,
}

impl<'a, R> RowBlock<'a, R> {
    /// 需要读取单元格的后续行
    pub fn continuation_rows(&self) -> [(RowRole, &'a R); 4] {
        [
            (RowRole::First, self.first),
            (RowRole::Second, self.second),
            (RowRole::Third, self.third),
            (RowRole::Fifth, self.fifth),
        ]
    }
}

/// 按起始标记把行序列切分为记录块
///
/// 每个起始行 i 对应 i、i+1、i+2、i+3、i+5 行。后续行本身带起始标记时，
/// 它同样会开始一个新块，因此块之间可以重叠。
pub fn group_rows<R: BlockMarker>(rows: &[R]) -> Result<Vec<RowBlock<'_, R>>> {
    let mut blocks = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        if !row.is_block_start() {
            continue;
        }

        // 读取任何字段之前先确认后续 5 行都存在
        let trailing = rows.len() - index - 1;
        if trailing < BLOCK_LEN - 1 {
            return Err(NotifierError::MalformedLayoutError {
                block_start: index,
                trailing,
            });
        }

        let window = &rows[index..index + BLOCK_LEN];
        for (offset, (role, member)) in RowRole::SEQUENCE.iter().zip(window).enumerate().skip(1) {
            if member.is_block_start() {
                debug!("Block at row {} overlaps block start at row {} ({:?})", index, index + offset, role);
            }
        }
        blocks.push(read_block(index, window)?);
    }

    Ok(blocks)
}

fn read_block<R>(start: usize, window: &[R]) -> Result<RowBlock<'_, R>> {
    match window {
        [header, first, second, third, _hidden, fifth] => Ok(RowBlock {
            start,
            header,
            first,
            second,
            third,
            fifth,
        }),
        _ => Err(NotifierError::MalformedLayoutError {
            block_start: start,
            trailing: window.len().saturating_sub(1),
        }),
    }
}
