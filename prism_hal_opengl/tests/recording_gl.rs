#![allow(dead_code)]
//! Recording GL function surface shared by the integration tests
//!
//! Every call is appended to a log as `name(arg, ...)` with enums in hex,
//! so tests can assert on the exact native calls the backend issued.
//! Object names come from one counter starting at 1.

use prism_hal_opengl::prism::gl;
use prism_hal_opengl::prism::{GLbitfield, GLenum, GLint, GLsizei, GLuint, GlCommands};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

pub struct RecordingGl {
    calls: Mutex<Vec<String>>,
    next_id: AtomicU32,
    framebuffer_status: AtomicU32,
    enabled: Mutex<HashSet<GLenum>>,
}

impl Default for RecordingGl {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            next_id: AtomicU32::new(1),
            framebuffer_status: AtomicU32::new(gl::FRAMEBUFFER_COMPLETE),
            enabled: Mutex::new(HashSet::new()),
        }
    }
}

impl RecordingGl {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Number of recorded calls starting with `prefix`
    pub fn count(&self, prefix: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| c.starts_with(prefix)).count()
    }

    pub fn contains(&self, call: &str) -> bool {
        self.calls.lock().unwrap().iter().any(|c| c == call)
    }

    /// Status returned by every later `check_framebuffer_status`
    pub fn set_framebuffer_status(&self, status: GLenum) {
        self.framebuffer_status.store(status, Ordering::SeqCst);
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn gen(&self, name: &str) -> GLuint {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.record(format!("{}() -> {}", name, id));
        id
    }
}

impl GlCommands for RecordingGl {
    fn gen_buffer(&self) -> GLuint {
        self.gen("gen_buffer")
    }
    fn delete_buffer(&self, buffer: GLuint) {
        self.record(format!("delete_buffer({})", buffer));
    }
    fn bind_buffer(&self, target: GLenum, buffer: GLuint) {
        self.record(format!("bind_buffer(0x{:04X}, {})", target, buffer));
    }
    fn buffer_data(&self, target: GLenum, size: usize, data: Option<&[u8]>, usage: GLenum) {
        self.record(format!("buffer_data(0x{:04X}, {}, {}, 0x{:04X})", target, size, data.is_some(), usage));
    }
    fn buffer_sub_data(&self, target: GLenum, offset: usize, data: &[u8]) {
        self.record(format!("buffer_sub_data(0x{:04X}, {}, {})", target, offset, data.len()));
    }
    fn bind_buffer_range(&self, target: GLenum, index: GLuint, buffer: GLuint, offset: usize, size: usize) {
        self.record(format!("bind_buffer_range(0x{:04X}, {}, {}, {}, {})", target, index, buffer, offset, size));
    }
    fn bind_buffer_base(&self, target: GLenum, index: GLuint, buffer: GLuint) {
        self.record(format!("bind_buffer_base(0x{:04X}, {}, {})", target, index, buffer));
    }

    fn gen_texture(&self) -> GLuint {
        self.gen("gen_texture")
    }
    fn delete_texture(&self, texture: GLuint) {
        self.record(format!("delete_texture({})", texture));
    }
    fn active_texture(&self, unit: GLenum) {
        self.record(format!("active_texture(0x{:04X})", unit));
    }
    fn bind_texture(&self, target: GLenum, texture: GLuint) {
        self.record(format!("bind_texture(0x{:04X}, {})", target, texture));
    }
    fn tex_storage_2d(&self, target: GLenum, levels: GLsizei, internal_format: GLenum, width: GLsizei, height: GLsizei) {
        self.record(format!(
            "tex_storage_2d(0x{:04X}, {}, 0x{:04X}, {}, {})",
            target, levels, internal_format, width, height
        ));
    }
    fn tex_storage_3d(
        &self,
        target: GLenum,
        levels: GLsizei,
        internal_format: GLenum,
        width: GLsizei,
        height: GLsizei,
        depth: GLsizei,
    ) {
        self.record(format!(
            "tex_storage_3d(0x{:04X}, {}, 0x{:04X}, {}, {}, {})",
            target, levels, internal_format, width, height, depth
        ));
    }
    fn tex_storage_2d_multisample(
        &self,
        target: GLenum,
        samples: GLsizei,
        internal_format: GLenum,
        width: GLsizei,
        height: GLsizei,
    ) {
        self.record(format!(
            "tex_storage_2d_multisample(0x{:04X}, {}, 0x{:04X}, {}, {})",
            target, samples, internal_format, width, height
        ));
    }
    fn tex_parameter_i(&self, target: GLenum, pname: GLenum, param: GLint) {
        self.record(format!("tex_parameter_i(0x{:04X}, 0x{:04X}, {})", target, pname, param));
    }
    fn gen_sampler(&self) -> GLuint {
        self.gen("gen_sampler")
    }
    fn delete_sampler(&self, sampler: GLuint) {
        self.record(format!("delete_sampler({})", sampler));
    }
    fn sampler_parameter_i(&self, sampler: GLuint, pname: GLenum, param: GLint) {
        self.record(format!("sampler_parameter_i({}, 0x{:04X}, 0x{:04X})", sampler, pname, param));
    }
    fn sampler_parameter_f(&self, sampler: GLuint, pname: GLenum, param: f32) {
        self.record(format!("sampler_parameter_f({}, 0x{:04X}, {})", sampler, pname, param));
    }
    fn bind_sampler(&self, unit: GLuint, sampler: GLuint) {
        self.record(format!("bind_sampler({}, {})", unit, sampler));
    }

    fn use_program(&self, program: GLuint) {
        self.record(format!("use_program({})", program));
    }
    fn uniform_block_binding(&self, program: GLuint, block_index: GLuint, binding: GLuint) {
        self.record(format!("uniform_block_binding({}, {}, {})", program, block_index, binding));
    }
    fn uniform_1i(&self, location: GLint, value: GLint) {
        self.record(format!("uniform_1i({}, {})", location, value));
    }
    fn uniform_fv(&self, location: GLint, components: usize, count: usize, values: &[f32]) {
        self.record(format!("uniform_fv({}, {}, {}, {:?})", location, components, count, values));
    }
    fn uniform_iv(&self, location: GLint, components: usize, count: usize, values: &[i32]) {
        self.record(format!("uniform_iv({}, {}, {}, {:?})", location, components, count, values));
    }
    fn uniform_matrix_fv(&self, location: GLint, dimension: usize, count: usize, values: &[f32]) {
        self.record(format!("uniform_matrix_fv({}, {}, {}, {})", location, dimension, count, values.len()));
    }

    fn enable_vertex_attrib_array(&self, location: GLuint) {
        self.record(format!("enable_vertex_attrib_array({})", location));
    }
    fn disable_vertex_attrib_array(&self, location: GLuint) {
        self.record(format!("disable_vertex_attrib_array({})", location));
    }
    fn vertex_attrib_pointer(
        &self,
        location: GLuint,
        size: GLint,
        ty: GLenum,
        normalized: bool,
        stride: GLsizei,
        offset: usize,
    ) {
        self.record(format!(
            "vertex_attrib_pointer({}, {}, 0x{:04X}, {}, {}, {})",
            location, size, ty, normalized, stride, offset
        ));
    }
    fn vertex_attrib_i_pointer(&self, location: GLuint, size: GLint, ty: GLenum, stride: GLsizei, offset: usize) {
        self.record(format!("vertex_attrib_i_pointer({}, {}, 0x{:04X}, {}, {})", location, size, ty, stride, offset));
    }
    fn vertex_attrib_divisor(&self, location: GLuint, divisor: GLuint) {
        self.record(format!("vertex_attrib_divisor({}, {})", location, divisor));
    }

    fn enable(&self, cap: GLenum) {
        self.enabled.lock().unwrap().insert(cap);
        self.record(format!("enable(0x{:04X})", cap));
    }
    fn disable(&self, cap: GLenum) {
        self.enabled.lock().unwrap().remove(&cap);
        self.record(format!("disable(0x{:04X})", cap));
    }
    fn is_enabled(&self, cap: GLenum) -> bool {
        self.enabled.lock().unwrap().contains(&cap)
    }
    fn cull_face(&self, mode: GLenum) {
        self.record(format!("cull_face(0x{:04X})", mode));
    }
    fn front_face(&self, mode: GLenum) {
        self.record(format!("front_face(0x{:04X})", mode));
    }
    fn polygon_mode(&self, face: GLenum, mode: GLenum) {
        self.record(format!("polygon_mode(0x{:04X}, 0x{:04X})", face, mode));
    }
    fn blend_equation_separate(&self, mode_rgb: GLenum, mode_alpha: GLenum) {
        self.record(format!("blend_equation_separate(0x{:04X}, 0x{:04X})", mode_rgb, mode_alpha));
    }
    fn blend_func_separate(&self, src_rgb: GLenum, dst_rgb: GLenum, src_alpha: GLenum, dst_alpha: GLenum) {
        self.record(format!(
            "blend_func_separate(0x{:04X}, 0x{:04X}, 0x{:04X}, 0x{:04X})",
            src_rgb, dst_rgb, src_alpha, dst_alpha
        ));
    }
    fn blend_color(&self, r: f32, g: f32, b: f32, a: f32) {
        self.record(format!("blend_color({}, {}, {}, {})", r, g, b, a));
    }
    fn color_mask(&self, r: bool, g: bool, b: bool, a: bool) {
        self.record(format!("color_mask({}, {}, {}, {})", r, g, b, a));
    }
    fn depth_mask(&self, enabled: bool) {
        self.record(format!("depth_mask({})", enabled));
    }
    fn depth_func(&self, func: GLenum) {
        self.record(format!("depth_func(0x{:04X})", func));
    }
    fn stencil_func_separate(&self, face: GLenum, func: GLenum, reference: GLint, mask: GLuint) {
        self.record(format!("stencil_func_separate(0x{:04X}, 0x{:04X}, {}, {})", face, func, reference, mask));
    }
    fn stencil_op_separate(&self, face: GLenum, stencil_fail: GLenum, depth_fail: GLenum, pass: GLenum) {
        self.record(format!(
            "stencil_op_separate(0x{:04X}, 0x{:04X}, 0x{:04X}, 0x{:04X})",
            face, stencil_fail, depth_fail, pass
        ));
    }
    fn stencil_mask_separate(&self, face: GLenum, mask: GLuint) {
        self.record(format!("stencil_mask_separate(0x{:04X}, {})", face, mask));
    }
    fn viewport(&self, x: GLint, y: GLint, width: GLsizei, height: GLsizei) {
        self.record(format!("viewport({}, {}, {}, {})", x, y, width, height));
    }
    fn depth_range_f(&self, near: f32, far: f32) {
        self.record(format!("depth_range_f({}, {})", near, far));
    }
    fn scissor(&self, x: GLint, y: GLint, width: GLsizei, height: GLsizei) {
        self.record(format!("scissor({}, {}, {}, {})", x, y, width, height));
    }
    fn polygon_offset(&self, factor: f32, units: f32) {
        self.record(format!("polygon_offset({}, {})", factor, units));
    }

    fn gen_framebuffer(&self) -> GLuint {
        self.gen("gen_framebuffer")
    }
    fn delete_framebuffer(&self, framebuffer: GLuint) {
        self.record(format!("delete_framebuffer({})", framebuffer));
    }
    fn bind_framebuffer(&self, target: GLenum, framebuffer: GLuint) {
        self.record(format!("bind_framebuffer(0x{:04X}, {})", target, framebuffer));
    }
    fn framebuffer_texture_2d(&self, target: GLenum, attachment: GLenum, tex_target: GLenum, texture: GLuint, level: GLint) {
        self.record(format!(
            "framebuffer_texture_2d(0x{:04X}, 0x{:04X}, 0x{:04X}, {}, {})",
            target, attachment, tex_target, texture, level
        ));
    }
    fn draw_buffers(&self, buffers: &[GLenum]) {
        self.record(format!("draw_buffers({:?})", buffers));
    }
    fn read_buffer(&self, mode: GLenum) {
        self.record(format!("read_buffer(0x{:04X})", mode));
    }
    fn check_framebuffer_status(&self, target: GLenum) -> GLenum {
        self.record(format!("check_framebuffer_status(0x{:04X})", target));
        self.framebuffer_status.load(Ordering::SeqCst)
    }
    fn blit_framebuffer(&self, src: [GLint; 4], dst: [GLint; 4], mask: GLbitfield, filter: GLenum) {
        self.record(format!("blit_framebuffer({:?}, {:?}, 0x{:04X}, 0x{:04X})", src, dst, mask, filter));
    }
    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32) {
        self.record(format!("clear_color({}, {}, {}, {})", r, g, b, a));
    }
    fn clear_depth_f(&self, depth: f32) {
        self.record(format!("clear_depth_f({})", depth));
    }
    fn clear_stencil(&self, stencil: GLint) {
        self.record(format!("clear_stencil({})", stencil));
    }
    fn clear(&self, mask: GLbitfield) {
        self.record(format!("clear(0x{:04X})", mask));
    }

    fn draw_arrays(&self, mode: GLenum, first: GLint, count: GLsizei) {
        self.record(format!("draw_arrays(0x{:04X}, {}, {})", mode, first, count));
    }
    fn draw_arrays_instanced(&self, mode: GLenum, first: GLint, count: GLsizei, instances: GLsizei) {
        self.record(format!("draw_arrays_instanced(0x{:04X}, {}, {}, {})", mode, first, count, instances));
    }
    fn draw_elements(&self, mode: GLenum, count: GLsizei, ty: GLenum, offset: usize) {
        self.record(format!("draw_elements(0x{:04X}, {}, 0x{:04X}, {})", mode, count, ty, offset));
    }
    fn draw_elements_instanced(&self, mode: GLenum, count: GLsizei, ty: GLenum, offset: usize, instances: GLsizei) {
        self.record(format!(
            "draw_elements_instanced(0x{:04X}, {}, 0x{:04X}, {}, {})",
            mode, count, ty, offset, instances
        ));
    }
    fn dispatch_compute(&self, x: GLuint, y: GLuint, z: GLuint) {
        self.record(format!("dispatch_compute({}, {}, {})", x, y, z));
    }
    fn memory_barrier(&self, barriers: GLbitfield) {
        self.record(format!("memory_barrier(0x{:08X})", barriers));
    }

    fn push_debug_group(&self, message: &str) {
        self.record(format!("push_debug_group({})", message));
    }
    fn pop_debug_group(&self) {
        self.record("pop_debug_group()".to_string());
    }
    fn debug_message_insert(&self, message: &str) {
        self.record(format!("debug_message_insert({})", message));
    }
    fn finish(&self) {
        self.record("finish()".to_string());
    }
}
