use crate::analysis::resolve_destinations;
use crate::il::*;
use crate::translator::tiny::{Tiny, TinyInstruction};
use crate::translator::{InstructionTranslation, MachineInstruction, Options, Translator};
use crate::Error;
use std::collections::{BTreeMap, BTreeSet};

/// An instruction carrying its own semantics.
struct Scripted {
    address: u64,
    group: InstructionGroup,
}

impl MachineInstruction for Scripted {
    fn address(&self) -> u64 {
        self.address
    }

    fn length(&self) -> usize {
        4
    }
}

struct ScriptedTranslator;

impl Translator for ScriptedTranslator {
    type Instruction = Scripted;

    fn program_counter(&self) -> Identifier {
        id("pc", 32)
    }

    fn stack_pointer(&self) -> Identifier {
        id("sp", 32)
    }

    fn translate_instruction(
        &self,
        instruction: &Scripted,
        _: &mut SymbolPool,
    ) -> Result<InstructionTranslation, Error> {
        Ok(InstructionTranslation::group(instruction.group.clone()))
    }
}

fn scripted(address: u64, assignments: Vec<Assignment>) -> Scripted {
    Scripted {
        address,
        group: InstructionGroup::from(assignments),
    }
}

fn tiny_program(instructions: &[TinyInstruction]) -> (Tiny, Program) {
    let translator = Tiny::new();
    let mut program = Program::for_translator(&translator);
    let assembly = program
        .add_block(&translator, instructions, &Options::default())
        .unwrap();
    assert!(assembly.rejected().is_empty());
    (translator, program)
}

fn label_at(program: &Program, address: u64) -> Label {
    program.symbol_pool().label_by_offset(address).unwrap()
}

fn irdst_count(block: &Block) -> usize {
    block
        .groups()
        .iter()
        .flat_map(|group| group.iter())
        .filter(|assignment| assignment.assigns(block.irdst()))
        .count()
}

#[test]
fn every_block_has_one_destination() {
    let (_, program) = tiny_program(&[
        TinyInstruction::movi(0x0, 1, 0x10),
        TinyInstruction::clrnz(0x4, 1),
        TinyInstruction::xchgb(0x8, 1),
        TinyInstruction::jr(0xc, 1),
    ]);

    assert_eq!(program.blocks().len(), 3);
    for block in program.blocks().values() {
        assert_eq!(irdst_count(block), 1, "{}", block);
        assert_eq!(block.groups().len(), block.lines().len());
    }
}

#[test]
fn two_destinations_abort_assembly() {
    let translator = ScriptedTranslator;
    let mut program = Program::for_translator(&translator);
    let irdst: Expression = translator.irdst().into();

    let result = program.add_block(
        &translator,
        &[
            scripted(0, vec![Assignment::new(irdst.clone(), expr_int(0x40, 32))]),
            scripted(4, vec![Assignment::new(irdst.clone(), expr_int(0x80, 32))]),
        ],
        &Options::default(),
    );

    assert!(matches!(result, Err(Error::MultipleDestinations(_))));
    assert!(program.blocks().is_empty());
}

#[test]
fn fallthrough_is_added() {
    let (_, program) = tiny_program(&[
        TinyInstruction::movi(0x100, 0, 1),
        TinyInstruction::add(0x104, 0, 0, 0),
    ]);

    let block = program.block(label_at(&program, 0x100)).unwrap();
    let last = block.groups().last().unwrap();
    assert_eq!(
        last.assignments(),
        &[Assignment::new(
            expr_id("IRDst", 32),
            expr_label(label_at(&program, 0x108), 32)
        )]
    );
    assert_eq!(block.lines().last().unwrap().kind(), LineKind::Fallthrough);
    assert_eq!(block.lines().last().unwrap().address(), 0x104);
}

#[test]
fn extra_blocks_fall_through_after_the_raw_block() {
    // The extra block of clrnz keeps its own destination, the block after
    // the split falls through past the last instruction.
    let (_, program) = tiny_program(&[TinyInstruction::clrnz(0x0, 2), TinyInstruction::nop(0x4)]);

    let tail = program.block(label_at(&program, 0x4)).unwrap();
    assert_eq!(
        tail.destination().unwrap(),
        Some(&expr_label(label_at(&program, 0x8), 32))
    );
    let clear = program.symbol_pool().label_by_name("lbl_gen_0").unwrap();
    let clear = program.block(clear).unwrap();
    assert!(clear.lines().iter().all(|line| line.address() == 0x0));
}

#[test]
fn malformed_partial_writes_reject_only_their_block() {
    let translator = ScriptedTranslator;
    let mut program = Program::for_translator(&translator);
    let r0 = expr_id("r0", 32);
    let slice = |start, end| Expression::slice(r0.clone(), start, end).unwrap();

    let overlapping = vec![
        Assignment::new(
            r0.clone(),
            Expression::compose(vec![(expr_int(1, 16), 0, 16), (slice(16, 32), 16, 32)]).unwrap(),
        ),
        Assignment::new(
            r0.clone(),
            Expression::compose(vec![
                (slice(0, 8), 0, 8),
                (expr_int(2, 16), 8, 24),
                (slice(24, 32), 24, 32),
            ])
            .unwrap(),
        ),
    ];

    let bad = program
        .add_block(&translator, &[scripted(0x0, overlapping)], &Options::default())
        .unwrap();
    assert_eq!(bad.blocks().len(), 0);
    assert_eq!(bad.rejected().len(), 1);
    assert!(matches!(
        bad.rejected()[0].1,
        Error::MalformedPartialWrite { .. }
    ));

    let good = program
        .add_block(
            &translator,
            &[scripted(0x10, vec![Assignment::new(r0.clone(), expr_int(1, 32))])],
            &Options::default(),
        )
        .unwrap();
    assert_eq!(good.blocks().len(), 1);
    assert_eq!(program.blocks().len(), 1);
}

#[test]
fn trackback_resolves_conditionals_and_registers() {
    let (translator, mut program) = tiny_program(&[TinyInstruction::jnz(0x0, 3, 0x80)]);
    program
        .add_block(
            &translator,
            &[
                TinyInstruction::movi(0x4, 5, 0x200),
                TinyInstruction::nop(0x8),
                TinyInstruction::jr(0xc, 5),
            ],
            &Options::default(),
        )
        .unwrap();

    let head = program.block(label_at(&program, 0x0)).unwrap();
    assert_eq!(
        resolve_destinations(head).unwrap(),
        BTreeSet::from([
            expr_label(label_at(&program, 0x80), 32),
            expr_label(label_at(&program, 0x4), 32),
        ])
    );

    let tail = program.block(label_at(&program, 0x4)).unwrap();
    assert_eq!(
        resolve_destinations(tail).unwrap(),
        BTreeSet::from([expr_int(0x200, 32)])
    );
}

#[test]
fn control_flow_graph_edges_are_tagged() {
    let (_, mut program) = tiny_program(&[TinyInstruction::jnz(0x0, 1, 0x40)]);
    let head = label_at(&program, 0x0);
    let taken = label_at(&program, 0x40);
    let not_taken = label_at(&program, 0x4);

    let graph = program.control_flow_graph().unwrap();

    assert_eq!(graph.edges().len(), 2);
    assert_eq!(graph.edge(head, taken).unwrap().kind(), BranchKind::Taken);
    assert_eq!(
        graph.edge(head, not_taken).unwrap().kind(),
        BranchKind::NotTaken
    );
    assert!(graph.is_placeholder(taken).unwrap());
    assert!(graph.is_placeholder(not_taken).unwrap());
    assert!(!graph.is_placeholder(head).unwrap());
}

#[test]
fn control_flow_graph_is_rebuilt_after_insertion() {
    let translator = Tiny::new();
    let (_, mut program) = tiny_program(&[TinyInstruction::jmp(0x0, 0x20)]);
    let target = label_at(&program, 0x20);

    assert!(program.control_flow_graph().unwrap().is_placeholder(target).unwrap());

    program
        .add_block(
            &translator,
            &[TinyInstruction::movi(0x20, 0, 0x30), TinyInstruction::jr(0x24, 0)],
            &Options::default(),
        )
        .unwrap();

    let successors = {
        let graph = program.control_flow_graph().unwrap();
        assert!(!graph.is_placeholder(target).unwrap());
        assert_eq!(graph.nodes().len(), 3);
        graph.successors(target).unwrap()
    };
    assert_eq!(successors, vec![label_at(&program, 0x30)]);
}

#[test]
fn rewriting_a_block_invalidates_the_graph() {
    let (_, mut program) = tiny_program(&[TinyInstruction::jmp(0x0, 0x20)]);
    let head = label_at(&program, 0x0);
    let old = label_at(&program, 0x20);

    assert_eq!(program.control_flow_graph().unwrap().successors(head).unwrap(), vec![old]);

    let new = program.symbol_pool_mut().label_for_offset(0x30);
    let mut replacements = BTreeMap::new();
    replacements.insert(expr_label(old, 32), expr_label(new, 32));
    program.replace_expression(head, &replacements).unwrap();

    assert_eq!(program.control_flow_graph().unwrap().successors(head).unwrap(), vec![new]);
}

#[test]
fn single_instructions_and_inserted_blocks() {
    let translator = Tiny::new();
    let mut program = Program::for_translator(&translator);
    let assembly = program
        .add_instruction(&translator, &TinyInstruction::jmp(0x0, 0x10), &Options::default())
        .unwrap();
    let head = label_at(&program, 0x0);
    assert_eq!(assembly.blocks(), &[head]);
    assert_eq!(
        program.control_flow_graph().unwrap().successors(head).unwrap(),
        vec![label_at(&program, 0x10)]
    );

    let target = program.symbol_pool_mut().label_for_offset(0x20);
    let mut block = Block::new(head, translator.irdst());
    block.push(
        InstructionGroup::from(vec![Assignment::new(
            translator.irdst().into(),
            expr_label(target, 32),
        )]),
        Line::new(0x0, 4, LineKind::Instruction),
    );
    assert!(program.insert_block(block).is_some());

    assert_eq!(
        program.control_flow_graph().unwrap().successors(head).unwrap(),
        vec![target]
    );
}

#[test]
fn def_use_of_a_store() {
    let (_, program) = tiny_program(&[TinyInstruction::store(0x0, 1, 4, 2)]);
    let label = label_at(&program, 0x0);

    let facts = program.def_use(&program.identifiers());
    let block = &facts[&label];

    assert!(block.reads(0).unwrap().contains(&id("r1", 32)));
    assert!(block.reads(0).unwrap().contains(&id("r2", 32)));
    assert!(!block.writes(0).unwrap().contains(&id("r1", 32)));
    assert!(block.writes(0).unwrap().is_empty());
    // The fallthrough group defines IRDst.
    assert_eq!(block.definitions(1).unwrap()[&id("IRDst", 32)].len(), 1);
}

#[test]
fn blocks_at_address() {
    let (_, program) = tiny_program(&[TinyInstruction::clrnz(0x10, 1), TinyInstruction::nop(0x14)]);

    // Both the block of clrnz and its extra block come from 0x10.
    assert_eq!(program.blocks_at_address(0x12).len(), 2);
    assert_eq!(program.blocks_at_address(0x14).len(), 1);
    assert!(program.blocks_at_address(0x18).is_empty());
}

#[test]
fn labels_for_expressions() {
    let (_, mut program) = tiny_program(&[TinyInstruction::nop(0x10)]);
    let label = label_at(&program, 0x10);

    assert_eq!(program.label_for(&expr_int(0x10, 32)).unwrap(), label);
    assert_eq!(program.label_for(&expr_label(label, 32)).unwrap(), label);
    assert!(program.label_for(&expr_id("r0", 32)).is_err());
    assert!(program.block_for(&expr_int(0x10, 32)).unwrap().is_some());
    assert!(program.block_for(&expr_int(0x99, 32)).unwrap().is_none());
}

#[test]
fn simplify_blocks() {
    let translator = ScriptedTranslator;
    let mut program = Program::for_translator(&translator);
    program
        .add_block(
            &translator,
            &[scripted(
                0x0,
                vec![Assignment::new(
                    expr_id("IRDst", 32),
                    Expression::add(expr_int(0x20, 32), expr_int(0x20, 32)).unwrap(),
                )],
            )],
            &Options::default(),
        )
        .unwrap();
    let head = label_at(&program, 0x0);

    program.simplify_blocks();

    assert_eq!(
        program.block(head).unwrap().destination().unwrap(),
        Some(&expr_int(0x40, 32))
    );
    let successors = program.control_flow_graph().unwrap().successors(head).unwrap();
    assert_eq!(successors, vec![label_at(&program, 0x40)]);
}

#[test]
fn serialization() {
    let (_, mut program) = tiny_program(&[TinyInstruction::jnz(0x0, 1, 0x40)]);
    let head = label_at(&program, 0x0);

    let json = serde_json::to_string(program.control_flow_graph().unwrap()).unwrap();
    let graph: ControlFlowGraph = serde_json::from_str(&json).unwrap();
    assert_eq!(&graph, program.control_flow_graph().unwrap());

    let block = program.block(head).unwrap();
    let json = serde_json::to_string(block).unwrap();
    let restored: Block = serde_json::from_str(&json).unwrap();
    assert_eq!(restored.destination().unwrap(), block.destination().unwrap());

    assert!(serde_json::to_string(&program).is_ok());
}
