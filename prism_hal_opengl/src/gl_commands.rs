/// GlCommands - the native OpenGL entry points the backend calls
///
/// The platform glue (EGL, GLX, WGL, a windowing crate) owns the context and
/// the function loader; it hands the backend an implementation of this trait.
/// Every call must reach the context that is current on the recording
/// thread. Method names follow the GL functions they forward to.

pub type GLenum = u32;
pub type GLuint = u32;
pub type GLint = i32;
pub type GLsizei = i32;
pub type GLbitfield = u32;

/// Native OpenGL function surface
pub trait GlCommands: Send + Sync {
    // ===== BUFFERS =====

    fn gen_buffer(&self) -> GLuint;
    fn delete_buffer(&self, buffer: GLuint);
    fn bind_buffer(&self, target: GLenum, buffer: GLuint);
    /// `glBufferData`; `data` is `None` to only allocate
    fn buffer_data(&self, target: GLenum, size: usize, data: Option<&[u8]>, usage: GLenum);
    fn buffer_sub_data(&self, target: GLenum, offset: usize, data: &[u8]);
    fn bind_buffer_range(&self, target: GLenum, index: GLuint, buffer: GLuint, offset: usize, size: usize);
    fn bind_buffer_base(&self, target: GLenum, index: GLuint, buffer: GLuint);

    // ===== TEXTURES AND SAMPLERS =====

    fn gen_texture(&self) -> GLuint;
    fn delete_texture(&self, texture: GLuint);
    /// `unit` is the enum value (`TEXTURE0 + n`)
    fn active_texture(&self, unit: GLenum);
    fn bind_texture(&self, target: GLenum, texture: GLuint);
    fn tex_storage_2d(&self, target: GLenum, levels: GLsizei, internal_format: GLenum, width: GLsizei, height: GLsizei);
    fn tex_storage_3d(
        &self,
        target: GLenum,
        levels: GLsizei,
        internal_format: GLenum,
        width: GLsizei,
        height: GLsizei,
        depth: GLsizei,
    );
    fn tex_storage_2d_multisample(
        &self,
        target: GLenum,
        samples: GLsizei,
        internal_format: GLenum,
        width: GLsizei,
        height: GLsizei,
    );
    fn tex_parameter_i(&self, target: GLenum, pname: GLenum, param: GLint);
    fn gen_sampler(&self) -> GLuint;
    fn delete_sampler(&self, sampler: GLuint);
    fn sampler_parameter_i(&self, sampler: GLuint, pname: GLenum, param: GLint);
    fn sampler_parameter_f(&self, sampler: GLuint, pname: GLenum, param: f32);
    /// `unit` is the unit number, not an enum
    fn bind_sampler(&self, unit: GLuint, sampler: GLuint);

    // ===== PROGRAMS AND UNIFORMS =====

    fn use_program(&self, program: GLuint);
    fn uniform_block_binding(&self, program: GLuint, block_index: GLuint, binding: GLuint);
    fn uniform_1i(&self, location: GLint, value: GLint);
    /// `glUniform{components}fv`
    fn uniform_fv(&self, location: GLint, components: usize, count: usize, values: &[f32]);
    /// `glUniform{components}iv`
    fn uniform_iv(&self, location: GLint, components: usize, count: usize, values: &[i32]);
    /// `glUniformMatrix{dimension}fv`, column-major, no transpose
    fn uniform_matrix_fv(&self, location: GLint, dimension: usize, count: usize, values: &[f32]);

    // ===== VERTEX INPUT =====

    fn enable_vertex_attrib_array(&self, location: GLuint);
    fn disable_vertex_attrib_array(&self, location: GLuint);
    fn vertex_attrib_pointer(
        &self,
        location: GLuint,
        size: GLint,
        ty: GLenum,
        normalized: bool,
        stride: GLsizei,
        offset: usize,
    );
    fn vertex_attrib_i_pointer(&self, location: GLuint, size: GLint, ty: GLenum, stride: GLsizei, offset: usize);
    fn vertex_attrib_divisor(&self, location: GLuint, divisor: GLuint);

    // ===== FIXED FUNCTION =====

    fn enable(&self, cap: GLenum);
    fn disable(&self, cap: GLenum);
    fn is_enabled(&self, cap: GLenum) -> bool;
    fn cull_face(&self, mode: GLenum);
    fn front_face(&self, mode: GLenum);
    /// Desktop GL only
    fn polygon_mode(&self, face: GLenum, mode: GLenum);
    fn blend_equation_separate(&self, mode_rgb: GLenum, mode_alpha: GLenum);
    fn blend_func_separate(&self, src_rgb: GLenum, dst_rgb: GLenum, src_alpha: GLenum, dst_alpha: GLenum);
    fn blend_color(&self, r: f32, g: f32, b: f32, a: f32);
    fn color_mask(&self, r: bool, g: bool, b: bool, a: bool);
    fn depth_mask(&self, enabled: bool);
    fn depth_func(&self, func: GLenum);
    fn stencil_func_separate(&self, face: GLenum, func: GLenum, reference: GLint, mask: GLuint);
    fn stencil_op_separate(&self, face: GLenum, stencil_fail: GLenum, depth_fail: GLenum, pass: GLenum);
    fn stencil_mask_separate(&self, face: GLenum, mask: GLuint);
    fn viewport(&self, x: GLint, y: GLint, width: GLsizei, height: GLsizei);
    fn depth_range_f(&self, near: f32, far: f32);
    fn scissor(&self, x: GLint, y: GLint, width: GLsizei, height: GLsizei);
    fn polygon_offset(&self, factor: f32, units: f32);

    // ===== FRAMEBUFFERS =====

    fn gen_framebuffer(&self) -> GLuint;
    fn delete_framebuffer(&self, framebuffer: GLuint);
    fn bind_framebuffer(&self, target: GLenum, framebuffer: GLuint);
    fn framebuffer_texture_2d(&self, target: GLenum, attachment: GLenum, tex_target: GLenum, texture: GLuint, level: GLint);
    fn draw_buffers(&self, buffers: &[GLenum]);
    fn read_buffer(&self, mode: GLenum);
    fn check_framebuffer_status(&self, target: GLenum) -> GLenum;
    /// Rectangles are `[x0, y0, x1, y1]`
    fn blit_framebuffer(&self, src: [GLint; 4], dst: [GLint; 4], mask: GLbitfield, filter: GLenum);
    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32);
    fn clear_depth_f(&self, depth: f32);
    fn clear_stencil(&self, stencil: GLint);
    fn clear(&self, mask: GLbitfield);

    // ===== DRAWING =====

    fn draw_arrays(&self, mode: GLenum, first: GLint, count: GLsizei);
    fn draw_arrays_instanced(&self, mode: GLenum, first: GLint, count: GLsizei, instances: GLsizei);
    /// `offset` is the byte offset into the bound element array buffer
    fn draw_elements(&self, mode: GLenum, count: GLsizei, ty: GLenum, offset: usize);
    fn draw_elements_instanced(&self, mode: GLenum, count: GLsizei, ty: GLenum, offset: usize, instances: GLsizei);
    fn dispatch_compute(&self, x: GLuint, y: GLuint, z: GLuint);
    fn memory_barrier(&self, barriers: GLbitfield);

    // ===== DEBUG AND SYNC =====

    fn push_debug_group(&self, message: &str);
    fn pop_debug_group(&self);
    fn debug_message_insert(&self, message: &str);
    fn finish(&self);
}

/// OpenGL enum values used by the backend
pub mod consts {
    use super::{GLbitfield, GLenum};

    // Data types
    pub const BYTE: GLenum = 0x1400;
    pub const UNSIGNED_BYTE: GLenum = 0x1401;
    pub const UNSIGNED_SHORT: GLenum = 0x1403;
    pub const INT: GLenum = 0x1404;
    pub const UNSIGNED_INT: GLenum = 0x1405;
    pub const FLOAT: GLenum = 0x1406;
    pub const HALF_FLOAT: GLenum = 0x140B;

    // Primitives
    pub const POINTS: GLenum = 0x0000;
    pub const LINES: GLenum = 0x0001;
    pub const LINE_STRIP: GLenum = 0x0003;
    pub const TRIANGLES: GLenum = 0x0004;
    pub const TRIANGLE_STRIP: GLenum = 0x0005;

    // Buffer targets and usage hints
    pub const ARRAY_BUFFER: GLenum = 0x8892;
    pub const ELEMENT_ARRAY_BUFFER: GLenum = 0x8893;
    pub const UNIFORM_BUFFER: GLenum = 0x8A11;
    pub const SHADER_STORAGE_BUFFER: GLenum = 0x90D2;
    pub const DRAW_INDIRECT_BUFFER: GLenum = 0x8F3F;
    pub const STATIC_DRAW: GLenum = 0x88E4;
    pub const DYNAMIC_DRAW: GLenum = 0x88E8;

    // Texture targets
    pub const TEXTURE_2D: GLenum = 0x0DE1;
    pub const TEXTURE_3D: GLenum = 0x806F;
    pub const TEXTURE_2D_ARRAY: GLenum = 0x8C1A;
    pub const TEXTURE_CUBE_MAP: GLenum = 0x8513;
    pub const TEXTURE_2D_MULTISAMPLE: GLenum = 0x9100;
    pub const TEXTURE0: GLenum = 0x84C0;
    pub const TEXTURE_BASE_LEVEL: GLenum = 0x813C;
    pub const TEXTURE_MAX_LEVEL: GLenum = 0x813D;

    // Sampler parameters
    pub const TEXTURE_MAG_FILTER: GLenum = 0x2800;
    pub const TEXTURE_MIN_FILTER: GLenum = 0x2801;
    pub const TEXTURE_WRAP_S: GLenum = 0x2802;
    pub const TEXTURE_WRAP_T: GLenum = 0x2803;
    pub const TEXTURE_WRAP_R: GLenum = 0x8072;
    pub const TEXTURE_COMPARE_MODE: GLenum = 0x884C;
    pub const TEXTURE_COMPARE_FUNC: GLenum = 0x884D;
    pub const COMPARE_REF_TO_TEXTURE: GLenum = 0x884E;
    pub const TEXTURE_MAX_ANISOTROPY: GLenum = 0x84FE;
    pub const NEAREST: GLenum = 0x2600;
    pub const LINEAR: GLenum = 0x2601;
    pub const NEAREST_MIPMAP_NEAREST: GLenum = 0x2700;
    pub const LINEAR_MIPMAP_NEAREST: GLenum = 0x2701;
    pub const NEAREST_MIPMAP_LINEAR: GLenum = 0x2702;
    pub const LINEAR_MIPMAP_LINEAR: GLenum = 0x2703;
    pub const REPEAT: GLenum = 0x2901;
    pub const CLAMP_TO_EDGE: GLenum = 0x812F;
    pub const MIRRORED_REPEAT: GLenum = 0x8370;

    // Internal formats
    pub const R8: GLenum = 0x8229;
    pub const RG8: GLenum = 0x822B;
    pub const RGBA8: GLenum = 0x8058;
    pub const SRGB8_ALPHA8: GLenum = 0x8C43;
    pub const R16F: GLenum = 0x822D;
    pub const RGBA16F: GLenum = 0x881A;
    pub const R32F: GLenum = 0x822E;
    pub const RGBA32F: GLenum = 0x8814;
    pub const R32UI: GLenum = 0x8236;
    pub const DEPTH_COMPONENT16: GLenum = 0x81A5;
    pub const DEPTH_COMPONENT32F: GLenum = 0x8CAC;
    pub const STENCIL_INDEX8: GLenum = 0x8D48;
    pub const DEPTH24_STENCIL8: GLenum = 0x88F0;
    pub const DEPTH32F_STENCIL8: GLenum = 0x8CAD;

    // Capabilities
    pub const CULL_FACE: GLenum = 0x0B44;
    pub const DEPTH_TEST: GLenum = 0x0B71;
    pub const STENCIL_TEST: GLenum = 0x0B90;
    pub const BLEND: GLenum = 0x0BE2;
    pub const SCISSOR_TEST: GLenum = 0x0C11;
    pub const POLYGON_OFFSET_FILL: GLenum = 0x8037;

    // Faces, winding and fill
    pub const FRONT: GLenum = 0x0404;
    pub const BACK: GLenum = 0x0405;
    pub const FRONT_AND_BACK: GLenum = 0x0408;
    pub const CW: GLenum = 0x0900;
    pub const CCW: GLenum = 0x0901;
    pub const LINE: GLenum = 0x1B01;
    pub const FILL: GLenum = 0x1B02;

    // Compare functions
    pub const NEVER: GLenum = 0x0200;
    pub const LESS: GLenum = 0x0201;
    pub const EQUAL: GLenum = 0x0202;
    pub const LEQUAL: GLenum = 0x0203;
    pub const GREATER: GLenum = 0x0204;
    pub const NOTEQUAL: GLenum = 0x0205;
    pub const GEQUAL: GLenum = 0x0206;
    pub const ALWAYS: GLenum = 0x0207;

    // Stencil operations
    pub const KEEP: GLenum = 0x1E00;
    pub const REPLACE: GLenum = 0x1E01;
    pub const INCR: GLenum = 0x1E02;
    pub const DECR: GLenum = 0x1E03;
    pub const INVERT: GLenum = 0x150A;
    pub const INCR_WRAP: GLenum = 0x8507;
    pub const DECR_WRAP: GLenum = 0x8508;

    // Blend factors and equations
    pub const ZERO: GLenum = 0;
    pub const ONE: GLenum = 1;
    pub const SRC_COLOR: GLenum = 0x0300;
    pub const ONE_MINUS_SRC_COLOR: GLenum = 0x0301;
    pub const SRC_ALPHA: GLenum = 0x0302;
    pub const ONE_MINUS_SRC_ALPHA: GLenum = 0x0303;
    pub const DST_ALPHA: GLenum = 0x0304;
    pub const ONE_MINUS_DST_ALPHA: GLenum = 0x0305;
    pub const DST_COLOR: GLenum = 0x0306;
    pub const ONE_MINUS_DST_COLOR: GLenum = 0x0307;
    pub const SRC_ALPHA_SATURATE: GLenum = 0x0308;
    pub const CONSTANT_COLOR: GLenum = 0x8001;
    pub const ONE_MINUS_CONSTANT_COLOR: GLenum = 0x8002;
    pub const SRC1_COLOR: GLenum = 0x88F9;
    pub const ONE_MINUS_SRC1_COLOR: GLenum = 0x88FA;
    pub const FUNC_ADD: GLenum = 0x8006;
    pub const MIN: GLenum = 0x8007;
    pub const MAX: GLenum = 0x8008;
    pub const FUNC_SUBTRACT: GLenum = 0x800A;
    pub const FUNC_REVERSE_SUBTRACT: GLenum = 0x800B;

    // Framebuffers
    pub const FRAMEBUFFER: GLenum = 0x8D40;
    pub const READ_FRAMEBUFFER: GLenum = 0x8CA8;
    pub const DRAW_FRAMEBUFFER: GLenum = 0x8CA9;
    pub const FRAMEBUFFER_COMPLETE: GLenum = 0x8CD5;
    pub const NONE: GLenum = 0;
    pub const COLOR_ATTACHMENT0: GLenum = 0x8CE0;
    pub const DEPTH_ATTACHMENT: GLenum = 0x8D00;
    pub const STENCIL_ATTACHMENT: GLenum = 0x8D20;
    pub const DEPTH_STENCIL_ATTACHMENT: GLenum = 0x821A;
    pub const COLOR_BUFFER_BIT: GLbitfield = 0x4000;
    pub const DEPTH_BUFFER_BIT: GLbitfield = 0x0100;
    pub const STENCIL_BUFFER_BIT: GLbitfield = 0x0400;

    // Memory barriers
    pub const ALL_BARRIER_BITS: GLbitfield = 0xFFFF_FFFF;
}
