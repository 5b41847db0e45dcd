use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wave::FragmentUniforms;

/// std140 image of the `WaveMaterial` block declared by the fragment wrapper.
///
/// `vec3` array elements occupy a full 16-byte slot, hence the `[f32; 4]`
/// colors; the trailing padding rounds the block up to a 16-byte multiple.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct MaterialBlock {
    pub colors: [[f32; 4]; 4],
    pub background: [f32; 4],
    pub resolution: [f32; 2],
    pub mouse: [f32; 2],
    pub time: f32,
    pub scale: f32,
    pub waves: i32,
    pub thickness: f32,
    pub stretch_x: f32,
    pub stretch_y: f32,
    pub blur: f32,
    pub speed: f32,
    pub coil: f32,
    pub _padding: [f32; 3],
}

impl From<&FragmentUniforms> for MaterialBlock {
    fn from(uniforms: &FragmentUniforms) -> Self {
        Self {
            colors: uniforms.colors.map(|color| color.extend(0.0).to_array()),
            background: uniforms.background.to_array(),
            resolution: uniforms.resolution.to_array(),
            mouse: uniforms.mouse.to_array(),
            time: uniforms.time,
            scale: uniforms.scale,
            waves: uniforms.waves,
            thickness: uniforms.thickness,
            stretch_x: uniforms.stretch_x,
            stretch_y: uniforms.stretch_y,
            blur: uniforms.blur,
            speed: uniforms.speed,
            coil: uniforms.coil,
            _padding: [0.0; 3],
        }
    }
}

/// std140 image of the `WaveCamera` block read by the vertex stage.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct CameraBlock {
    pub projection: [[f32; 4]; 4],
    pub model_view: [[f32; 4]; 4],
}

impl CameraBlock {
    pub fn new(projection: Mat4, model_view: Mat4) -> Self {
        Self {
            projection: projection.to_cols_array_2d(),
            model_view: model_view.to_cols_array_2d(),
        }
    }
}

impl Default for CameraBlock {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY, Mat4::IDENTITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{offset_of, size_of};
    use wave::{names, Scene, WaveParams};

    #[test]
    fn material_block_follows_std140_offsets() {
        assert_eq!(size_of::<MaterialBlock>(), 144);
        assert_eq!(offset_of!(MaterialBlock, background), 64);
        assert_eq!(offset_of!(MaterialBlock, resolution), 80);
        assert_eq!(offset_of!(MaterialBlock, mouse), 88);
        assert_eq!(offset_of!(MaterialBlock, time), 96);
        assert_eq!(offset_of!(MaterialBlock, waves), 104);
        assert_eq!(offset_of!(MaterialBlock, coil), 128);
    }

    #[test]
    fn camera_block_is_two_matrices() {
        assert_eq!(size_of::<CameraBlock>(), 128);
        assert_eq!(offset_of!(CameraBlock, model_view), 64);
    }

    #[test]
    fn material_block_copies_table_values() {
        let scene = Scene::wave(&WaveParams::default(), 1.0);
        let table = scene.uniforms().unwrap();
        let uniforms = FragmentUniforms::from_table(table).unwrap();
        let block = MaterialBlock::from(&uniforms);

        let colors = table.vec3_array4(names::COLORS).unwrap();
        for (slot, color) in block.colors.iter().zip(colors) {
            assert_eq!(&slot[..3], &color[..]);
            assert_eq!(slot[3], 0.0);
        }
        assert_eq!(block.waves, table.int(names::WAVES).unwrap());
        assert_eq!(block.resolution, [100.0, 100.0]);
        assert_eq!(block.background, table.vec4(names::BACKGROUND).unwrap());
    }

    #[test]
    fn camera_block_is_column_major() {
        let translation = Mat4::from_translation(glam::Vec3::new(1.0, 2.0, 3.0));
        let block = CameraBlock::new(Mat4::IDENTITY, translation);
        assert_eq!(block.model_view[3], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(block.projection, Mat4::IDENTITY.to_cols_array_2d());
    }
}
