//! Minimal SPIR-V assembler for building test modules word by word.
#![allow(dead_code)]

use spirv_headers as spv;

const MAGIC: u32 = 0x0723_0203;
const VERSION_1_0: u32 = 0x0001_0000;

pub fn string_words(s: &str) -> Vec<u32> {
    let mut bytes = s.as_bytes().to_vec();
    bytes.push(0);
    while bytes.len() % 4 != 0 {
        bytes.push(0);
    }
    bytes.chunks(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

#[derive(Debug)]
pub struct ModuleBuilder {
    body: Vec<u32>,
    bound: u32,
    uint: Option<u32>,
    float: Option<u32>,
}

impl ModuleBuilder {
    pub fn new() -> Self {
        let mut builder = Self {
            body: Vec::new(),
            bound: 1,
            uint: None,
            float: None,
        };
        builder.inst(spv::Op::Capability, &[spv::Capability::Shader as u32]);
        builder.inst(spv::Op::MemoryModel, &[
            spv::AddressingModel::Logical as u32,
            spv::MemoryModel::GLSL450 as u32,
        ]);
        builder
    }

    pub fn id(&mut self) -> u32 {
        let id = self.bound;
        self.bound += 1;
        id
    }

    pub fn inst(&mut self, op: spv::Op, operands: &[u32]) -> &mut Self {
        let count = operands.len() as u32 + 1;
        self.body.push((count << 16) | op as u32);
        self.body.extend_from_slice(operands);
        self
    }

    /// An instruction whose operands are `pre`, a string literal, then
    /// `post`.
    pub fn inst_str(&mut self, op: spv::Op, pre: &[u32], s: &str, post: &[u32]) ->
        &mut Self
    {
        let mut operands = pre.to_vec();
        operands.extend(string_words(s));
        operands.extend_from_slice(post);
        self.inst(op, &operands)
    }

    pub fn entry_point(&mut self, model: spv::ExecutionModel, name: &str) -> u32 {
        let func = self.id();
        self.inst_str(spv::Op::EntryPoint, &[model as u32, func], name, &[]);
        func
    }

    pub fn name(&mut self, target: u32, name: &str) -> &mut Self {
        self.inst_str(spv::Op::Name, &[target], name, &[])
    }

    pub fn decorate(&mut self, target: u32, deco: spv::Decoration, args: &[u32]) ->
        &mut Self
    {
        let mut operands = vec![target, deco as u32];
        operands.extend_from_slice(args);
        self.inst(spv::Op::Decorate, &operands)
    }

    pub fn member_decorate(
        &mut self,
        target: u32,
        member: u32,
        deco: spv::Decoration,
        args: &[u32],
    ) -> &mut Self {
        let mut operands = vec![target, member, deco as u32];
        operands.extend_from_slice(args);
        self.inst(spv::Op::MemberDecorate, &operands)
    }

    pub fn type_uint(&mut self) -> u32 {
        if let Some(id) = self.uint { return id; }
        let id = self.id();
        self.inst(spv::Op::TypeInt, &[id, 32, 0]);
        self.uint = Some(id);
        id
    }

    pub fn type_float(&mut self) -> u32 {
        if let Some(id) = self.float { return id; }
        let id = self.id();
        self.inst(spv::Op::TypeFloat, &[id, 32]);
        self.float = Some(id);
        id
    }

    pub fn type_vector(&mut self, component: u32, count: u32) -> u32 {
        let id = self.id();
        self.inst(spv::Op::TypeVector, &[id, component, count]);
        id
    }

    pub fn type_vec4(&mut self) -> u32 {
        let float = self.type_float();
        self.type_vector(float, 4)
    }

    pub fn type_matrix(&mut self, column: u32, count: u32) -> u32 {
        let id = self.id();
        self.inst(spv::Op::TypeMatrix, &[id, column, count]);
        id
    }

    pub fn type_image(&mut self, dim: spv::Dim, arrayed: bool, ms: bool, sampled: u32) ->
        u32
    {
        let float = self.type_float();
        let id = self.id();
        self.inst(spv::Op::TypeImage, &[
            id,
            float,
            dim as u32,
            0,
            arrayed as u32,
            ms as u32,
            sampled,
            spv::ImageFormat::Unknown as u32,
        ]);
        id
    }

    pub fn type_sampler(&mut self) -> u32 {
        let id = self.id();
        self.inst(spv::Op::TypeSampler, &[id]);
        id
    }

    pub fn type_sampled_image(&mut self, image: u32) -> u32 {
        let id = self.id();
        self.inst(spv::Op::TypeSampledImage, &[id, image]);
        id
    }

    pub fn constant(&mut self, value: u32) -> u32 {
        let ty = self.type_uint();
        let id = self.id();
        self.inst(spv::Op::Constant, &[ty, id, value]);
        id
    }

    pub fn spec_constant(&mut self, value: u32) -> u32 {
        let ty = self.type_uint();
        let id = self.id();
        self.inst(spv::Op::SpecConstant, &[ty, id, value]);
        id
    }

    pub fn type_array(&mut self, elem: u32, length: u32) -> u32 {
        let length = self.constant(length);
        self.type_array_of(elem, length)
    }

    /// An array whose length is the constant `length`.
    pub fn type_array_of(&mut self, elem: u32, length: u32) -> u32 {
        let id = self.id();
        self.inst(spv::Op::TypeArray, &[id, elem, length]);
        id
    }

    pub fn type_runtime_array(&mut self, elem: u32) -> u32 {
        let id = self.id();
        self.inst(spv::Op::TypeRuntimeArray, &[id, elem]);
        id
    }

    pub fn type_struct(&mut self, members: &[u32]) -> u32 {
        let id = self.id();
        let mut operands = vec![id];
        operands.extend_from_slice(members);
        self.inst(spv::Op::TypeStruct, &operands);
        id
    }

    /// A block struct with members laid out at the given offsets.
    pub fn type_block(&mut self, members: &[(u32, u32)], deco: spv::Decoration) -> u32 {
        let types: Vec<_> = members.iter().map(|&(ty, _)| ty).collect();
        let id = self.type_struct(&types);
        self.decorate(id, deco, &[]);
        for (i, &(_, offset)) in members.iter().enumerate() {
            self.member_decorate(id, i as u32, spv::Decoration::Offset, &[offset]);
        }
        id
    }

    pub fn type_pointer(&mut self, storage_class: spv::StorageClass, ty: u32) -> u32 {
        let id = self.id();
        self.inst(spv::Op::TypePointer, &[id, storage_class as u32, ty]);
        id
    }

    pub fn variable(&mut self, storage_class: spv::StorageClass, ty: u32) -> u32 {
        let ptr = self.type_pointer(storage_class, ty);
        let id = self.id();
        self.inst(spv::Op::Variable, &[ptr, id, storage_class as u32]);
        id
    }

    pub fn push_block(&mut self, name: &str, block: u32) -> u32 {
        let var = self.variable(spv::StorageClass::PushConstant, block);
        self.name(var, name);
        var
    }

    /// Declares a resource variable at `layout(set, binding)`.
    pub fn resource(
        &mut self,
        name: &str,
        set: u32,
        binding: u32,
        storage_class: spv::StorageClass,
        ty: u32,
    ) -> u32 {
        let var = self.variable(storage_class, ty);
        self.name(var, name);
        self.decorate(var, spv::Decoration::DescriptorSet, &[set]);
        self.decorate(var, spv::Decoration::Binding, &[binding]);
        var
    }

    pub fn uniform_constant(&mut self, name: &str, set: u32, binding: u32, ty: u32) ->
        u32
    {
        self.resource(name, set, binding, spv::StorageClass::UniformConstant, ty)
    }

    pub fn finish(&self) -> Vec<u32> {
        let mut words = vec![MAGIC, VERSION_1_0, 0, self.bound, 0];
        words.extend_from_slice(&self.body);
        words
    }
}

/// A module with a single fragment entry point named "main".
pub fn fragment() -> ModuleBuilder {
    let mut builder = ModuleBuilder::new();
    builder.entry_point(spv::ExecutionModel::Fragment, "main");
    builder
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
