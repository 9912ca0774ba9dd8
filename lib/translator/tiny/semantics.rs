use crate::il::Expression as Expr;
use crate::il::*;
use crate::translator::tiny::TinyInstruction;
use crate::translator::{InstructionTranslation, MachineInstruction};
use crate::Error;

/// Struct for dealing with tiny registers
pub struct TinyRegister {
    name: &'static str,
    /// The size of this register in bits
    bits: usize,
}

impl TinyRegister {
    pub fn name(&self) -> &str {
        self.name
    }

    pub fn identifier(&self) -> Identifier {
        id(self.name, self.bits)
    }

    pub fn expression(&self) -> Expr {
        expr_id(self.name, self.bits)
    }
}

const TINY_REGISTERS: &[TinyRegister] = &[
    TinyRegister { name: "r0", bits: 32 },
    TinyRegister { name: "r1", bits: 32 },
    TinyRegister { name: "r2", bits: 32 },
    TinyRegister { name: "r3", bits: 32 },
    TinyRegister { name: "r4", bits: 32 },
    TinyRegister { name: "r5", bits: 32 },
    TinyRegister { name: "r6", bits: 32 },
    TinyRegister { name: "r7", bits: 32 },
];

/// Returns the general purpose register with the given number.
pub fn get_register(
    instruction: &TinyInstruction,
    number: u8,
) -> Result<&'static TinyRegister, Error> {
    TINY_REGISTERS
        .get(number as usize)
        .ok_or_else(|| Error::UnhandledInstruction(format!("{}", instruction)))
}

pub fn pc() -> Identifier {
    id("pc", 32)
}

pub fn sp() -> Identifier {
    id("sp", 32)
}

pub fn irdst() -> Identifier {
    id("IRDst", 32)
}

fn label(label: Label) -> Expr {
    expr_label(label, 32)
}

/// The label of the instruction following `instruction`.
fn next_label(instruction: &TinyInstruction, symbol_pool: &mut SymbolPool) -> Label {
    symbol_pool.label_for_offset(instruction.next_address())
}

fn assign(dst: Expr, src: Expr) -> InstructionTranslation {
    let mut group = InstructionGroup::new();
    group.assign(dst, src);
    InstructionTranslation::group(group)
}

pub fn mov(instruction: &TinyInstruction, dst: u8, src: u8) -> Result<InstructionTranslation, Error> {
    let dst = get_register(instruction, dst)?.expression();
    let src = get_register(instruction, src)?.expression();
    Ok(assign(dst, src))
}

pub fn movi(instruction: &TinyInstruction, dst: u8, imm: u32) -> Result<InstructionTranslation, Error> {
    let dst = get_register(instruction, dst)?.expression();
    Ok(assign(dst, expr_int(imm as u64, 32)))
}

pub fn add(
    instruction: &TinyInstruction,
    dst: u8,
    lhs: u8,
    rhs: u8,
) -> Result<InstructionTranslation, Error> {
    let dst = get_register(instruction, dst)?.expression();
    let lhs = get_register(instruction, lhs)?.expression();
    let rhs = get_register(instruction, rhs)?.expression();
    Ok(assign(dst, Expr::add(lhs, rhs)?))
}

pub fn load(
    instruction: &TinyInstruction,
    dst: u8,
    base: u8,
    offset: u32,
) -> Result<InstructionTranslation, Error> {
    let dst = get_register(instruction, dst)?.expression();
    let base = get_register(instruction, base)?.expression();
    let address = Expr::add(base, expr_int(offset as u64, 32))?;
    Ok(assign(dst, Expr::memory(address, 32)))
}

pub fn store(
    instruction: &TinyInstruction,
    base: u8,
    offset: u32,
    src: u8,
) -> Result<InstructionTranslation, Error> {
    let base = get_register(instruction, base)?.expression();
    let src = get_register(instruction, src)?.expression();
    let address = Expr::add(base, expr_int(offset as u64, 32))?;
    Ok(assign(Expr::memory(address, 32), src))
}

/// Lowered as two partial writes, one per byte, which are merged later.
pub fn xchgb(instruction: &TinyInstruction, reg: u8) -> Result<InstructionTranslation, Error> {
    let reg = get_register(instruction, reg)?.expression();
    let slice = |start, end| Expr::slice(reg.clone(), start, end);

    let mut group = InstructionGroup::new();
    group.assign(
        reg.clone(),
        Expr::compose(vec![
            (slice(0, 8)?, 0, 8),
            (slice(0, 8)?, 8, 16),
            (slice(16, 32)?, 16, 32),
        ])?,
    );
    group.assign(
        reg.clone(),
        Expr::compose(vec![(slice(8, 16)?, 0, 8), (slice(8, 32)?, 8, 32)])?,
    );

    Ok(InstructionTranslation::group(group))
}

pub fn jmp(symbol_pool: &mut SymbolPool, target: u64) -> InstructionTranslation {
    let target = symbol_pool.label_for_offset(target);
    assign(irdst().into(), label(target))
}

pub fn jnz(
    instruction: &TinyInstruction,
    symbol_pool: &mut SymbolPool,
    reg: u8,
    target: u64,
) -> Result<InstructionTranslation, Error> {
    let reg = get_register(instruction, reg)?.expression();
    let taken = symbol_pool.label_for_offset(target);
    let not_taken = next_label(instruction, symbol_pool);
    let destination = Expr::conditional(reg, label(taken), label(not_taken))?;
    Ok(assign(irdst().into(), destination))
}

pub fn jr(instruction: &TinyInstruction, reg: u8) -> Result<InstructionTranslation, Error> {
    let reg = get_register(instruction, reg)?.expression();
    Ok(assign(irdst().into(), reg))
}

pub fn ret() -> Result<InstructionTranslation, Error> {
    let sp: Expr = sp().into();

    let mut group = InstructionGroup::new();
    group.assign(irdst().into(), Expr::memory(sp.clone(), 32));
    group.assign(sp.clone(), Expr::add(sp, expr_int(4, 32))?);

    Ok(InstructionTranslation::group(group))
}

/// The clear happens in an extra block, which the current block branches
/// to when `reg` is not zero.
pub fn clrnz(
    instruction: &TinyInstruction,
    symbol_pool: &mut SymbolPool,
    reg: u8,
) -> Result<InstructionTranslation, Error> {
    let reg = get_register(instruction, reg)?.expression();
    let clear = symbol_pool.new_anonymous_label();
    let next = next_label(instruction, symbol_pool);

    let mut clear_group = InstructionGroup::new();
    clear_group.assign(reg.clone(), expr_int(0, 32));
    clear_group.assign(irdst().into(), label(next));

    let mut clear_block = Block::new(clear, irdst());
    clear_block.push(clear_group, Line::instruction(instruction));

    let mut group = InstructionGroup::new();
    group.assign(
        irdst().into(),
        Expr::conditional(reg, label(clear), label(next))?,
    );

    Ok(InstructionTranslation::new(group, vec![clear_block]))
}
