use relax_gpu::prelude::*;

#[spirv(compute(threads(8, 8)))]
#[allow(clippy::too_many_arguments)]
pub fn main(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(descriptor_set = 0, binding = 0, uniform)]
    params: &SplitScreenPassParams,
    #[spirv(descriptor_set = 1, binding = 0)] view_z: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 1)] diffuse_input: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 2)] specular_input: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 3)] diffuse: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 4)] specular: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 5)] out_diffuse: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 6)] out_specular: TexRgba32,
) {
    let screen_pos = global_id.xy();

    if !Screen::new(params.resolution).contains(screen_pos) {
        return;
    }

    let out = SplitScreen {
        params,
        view_z: &view_z,
        diffuse_input: &diffuse_input,
        specular_input: &specular_input,
        diffuse: &diffuse,
        specular: &specular,
    }
    .run(screen_pos);

    unsafe {
        out_diffuse.write(screen_pos, out.diffuse);
        out_specular.write(screen_pos, out.specular);
    }
}
